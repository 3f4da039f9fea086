//! Credential field table and scheme-agnostic access
//!
//! Every credential field has one entry. Reads and writes go through the
//! entry's kind and the setting's [`CredentialHolder`] slots, so callers never
//! branch on which representation is active.

use super::detect::{self, Detected};
use super::{
    Credential, CredentialField, CredentialFormat, CredentialHolder, CredentialKind,
    CredentialStore, CredentialValue, SchemeTag, SecretFlags,
};
use crate::error::{MetaError, MetaResult};
use crate::validation::{parse_pkcs11_uri, validate_credential_path};
use serde::Serialize;
use tracing::{debug, warn};

/// Static description of one credential field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CredentialFieldEntry {
    pub field: CredentialField,
    /// Setting key, e.g. "phase2-ca-cert"
    pub key: &'static str,
    pub kind: CredentialKind,
    /// Whether the field carries a secret (password-protected private keys)
    pub is_secret: bool,
    /// Hint used when naming externalised blob files
    pub file_suffix: &'static str,
    pub password_key: Option<&'static str>,
    pub password_flags_key: Option<&'static str>,
    /// Certificate field that mirrors a PKCS#12 private key
    pub companion: Option<CredentialField>,
}

impl CredentialFieldEntry {
    const fn certificate(
        field: CredentialField,
        key: &'static str,
        kind: CredentialKind,
        file_suffix: &'static str,
    ) -> Self {
        Self {
            field,
            key,
            kind,
            is_secret: false,
            file_suffix,
            password_key: None,
            password_flags_key: None,
            companion: None,
        }
    }

    const fn private_key(
        field: CredentialField,
        key: &'static str,
        file_suffix: &'static str,
        password_key: &'static str,
        password_flags_key: &'static str,
        companion: CredentialField,
    ) -> Self {
        Self {
            field,
            key,
            kind: CredentialKind::PrivateKey,
            is_secret: true,
            file_suffix,
            password_key: Some(password_key),
            password_flags_key: Some(password_flags_key),
            companion: Some(companion),
        }
    }
}

/// Field table indexed by [`CredentialField`], sentinel last
pub static CREDENTIAL_FIELDS: [CredentialFieldEntry; 7] = [
    CredentialFieldEntry::certificate(
        CredentialField::CaCert,
        "ca-cert",
        CredentialKind::CaCertificate,
        "ca-cert",
    ),
    CredentialFieldEntry::certificate(
        CredentialField::Phase2CaCert,
        "phase2-ca-cert",
        CredentialKind::CaCertificate,
        "inner-ca-cert",
    ),
    CredentialFieldEntry::certificate(
        CredentialField::ClientCert,
        "client-cert",
        CredentialKind::ClientCertificate,
        "client-cert",
    ),
    CredentialFieldEntry::certificate(
        CredentialField::Phase2ClientCert,
        "phase2-client-cert",
        CredentialKind::ClientCertificate,
        "inner-client-cert",
    ),
    CredentialFieldEntry::private_key(
        CredentialField::PrivateKey,
        "private-key",
        "private-key",
        "private-key-password",
        "private-key-password-flags",
        CredentialField::ClientCert,
    ),
    CredentialFieldEntry::private_key(
        CredentialField::Phase2PrivateKey,
        "phase2-private-key",
        "inner-private-key",
        "phase2-private-key-password",
        "phase2-private-key-password-flags",
        CredentialField::Phase2ClientCert,
    ),
    CredentialFieldEntry::certificate(CredentialField::Unknown, "", CredentialKind::Unknown, ""),
];

/// The six real fields in table order
pub fn entries() -> impl Iterator<Item = &'static CredentialFieldEntry> + Clone {
    CREDENTIAL_FIELDS[..CredentialField::ALL.len()].iter()
}

/// Find a field by its setting key; the sentinel is never returned
pub fn lookup_by_key(key: &str) -> Option<&'static CredentialFieldEntry> {
    entries().find(|entry| entry.key == key)
}

fn known_entry(field: CredentialField) -> MetaResult<&'static CredentialFieldEntry> {
    match field {
        CredentialField::Unknown => Err(MetaError::NotFound("unknown credential field".to_string())),
        field => Ok(field.entry()),
    }
}

fn slot<S: CredentialHolder + ?Sized>(field: CredentialField, setting: &S) -> Option<&Credential> {
    match field {
        CredentialField::Unknown => None,
        field => setting.credential(field),
    }
}

/// Storage scheme currently active for `field`
pub fn active_scheme<S: CredentialHolder + ?Sized>(field: CredentialField, setting: &S) -> SchemeTag {
    slot(field, setting).map_or(SchemeTag::Unknown, Credential::scheme)
}

/// Encoding detected when `field` was last written
pub fn format<S: CredentialHolder + ?Sized>(field: CredentialField, setting: &S) -> CredentialFormat {
    slot(field, setting).map_or(CredentialFormat::Unknown, Credential::format)
}

/// Current value of `field` in whichever representation is active
pub fn read<S: CredentialHolder + ?Sized>(field: CredentialField, setting: &S) -> CredentialValue<'_> {
    slot(field, setting).map_or(CredentialValue::None, |credential| credential.store().as_value())
}

/// Store `value` in `field` using `scheme`, returning the detected encoding.
///
/// Passing no value clears the field and its password. All validation runs
/// before the setting is touched, so a failed write leaves it unchanged.
/// A private key that needs a passphrase is accepted without one only when
/// the field's secret flags say an agent supplies it later.
pub fn write<S: CredentialHolder + ?Sized>(
    field: CredentialField,
    setting: &mut S,
    value: Option<&[u8]>,
    scheme: SchemeTag,
    password: Option<&str>,
) -> MetaResult<CredentialFormat> {
    let entry = known_entry(field)?;

    if password.is_some() && !entry.is_secret {
        return Err(MetaError::NotApplicable(format!(
            "'{}' does not take a password",
            entry.key
        )));
    }

    if setting.credential(field).is_none() || (entry.is_secret && setting.key_password(field).is_none()) {
        return Err(MetaError::NotFound(format!(
            "setting does not carry '{}'",
            entry.key
        )));
    }

    let Some(value) = value else {
        clear(entry, setting);
        return Ok(CredentialFormat::Unknown);
    };

    let (store, detected) = prepare(entry, value, scheme).inspect_err(|e| {
        warn!("Rejected {} value for {}: {}", scheme, entry.key, e);
    })?;

    let password = password.filter(|p| !p.is_empty());
    if entry.is_secret && detected.needs_password && password.is_none() {
        let flags = setting
            .key_password(field)
            .map_or(SecretFlags::NONE, |slot| slot.flags());
        if !flags.stored_externally() {
            return Err(MetaError::MissingPassword(format!(
                "'{}' is encrypted ({}) and no password was given",
                entry.key, detected.format
            )));
        }
    }

    let format = detected.format;
    drop_stale_mirror(entry, setting);
    if format == CredentialFormat::Pkcs12 {
        if let Some(companion) = entry.companion {
            if let Some(credential) = setting.credential_mut(companion) {
                credential.replace(store.clone(), format);
                debug!("Mirrored PKCS#12 {} into {}", entry.key, companion);
            }
        }
    }

    if let Some(credential) = setting.credential_mut(field) {
        credential.replace(store, format);
    }
    if entry.is_secret {
        if let Some(slot) = setting.key_password_mut(field) {
            slot.set_password(password.map(str::to_owned));
        }
    }

    debug!("Stored {} ({}, {})", entry.key, scheme, format);
    Ok(format)
}

/// Clear the companion client certificate if it still mirrors this field's PKCS#12 value
fn drop_stale_mirror<S: CredentialHolder + ?Sized>(entry: &CredentialFieldEntry, setting: &mut S) {
    let Some(companion) = entry.companion else {
        return;
    };
    let stale = match setting.credential(entry.field) {
        Some(credential) if credential.format() == CredentialFormat::Pkcs12 => credential.store().clone(),
        _ => return,
    };

    if let Some(mirror) = setting.credential_mut(companion) {
        if mirror.format() == CredentialFormat::Pkcs12 && *mirror.store() == stale {
            mirror.clear();
            debug!("Cleared PKCS#12 mirror of {} from {}", entry.key, companion);
        }
    }
}

fn clear<S: CredentialHolder + ?Sized>(entry: &CredentialFieldEntry, setting: &mut S) {
    drop_stale_mirror(entry, setting);
    if let Some(credential) = setting.credential_mut(entry.field) {
        credential.clear();
    }
    if entry.is_secret {
        if let Some(slot) = setting.key_password_mut(entry.field) {
            slot.set_password(None);
        }
    }
    debug!("Cleared {}", entry.key);
}

fn prepare(
    entry: &CredentialFieldEntry,
    value: &[u8],
    scheme: SchemeTag,
) -> MetaResult<(CredentialStore, Detected)> {
    match scheme {
        SchemeTag::Path => {
            let path = validate_credential_path(value)?;
            let detected = detect::detect_path(entry.kind, path)?;
            Ok((CredentialStore::Path(path.to_string()), detected))
        }
        SchemeTag::Blob => {
            let detected = detect::detect_blob(entry.kind, value)?;
            Ok((CredentialStore::Blob(value.to_vec()), detected))
        }
        SchemeTag::Uri => {
            let uri = std::str::from_utf8(value)
                .map_err(|_| MetaError::InvalidScheme("URI is not valid UTF-8".to_string()))?;
            parse_pkcs11_uri(uri)?;
            Ok((
                CredentialStore::Uri(uri.to_string()),
                Detected {
                    format: CredentialFormat::Unknown,
                    needs_password: false,
                },
            ))
        }
        SchemeTag::None | SchemeTag::Unknown => Err(MetaError::InvalidScheme(format!(
            "cannot store a value with scheme '{}'",
            scheme
        ))),
    }
}

fn secret_entry(field: CredentialField) -> MetaResult<&'static CredentialFieldEntry> {
    let entry = known_entry(field)?;
    if entry.is_secret {
        Ok(entry)
    } else {
        Err(MetaError::NotApplicable(format!(
            "'{}' has no secret",
            entry.key
        )))
    }
}

/// Secret flags of the password protecting `field`
pub fn secret_flags<S: CredentialHolder + ?Sized>(
    field: CredentialField,
    setting: &S,
) -> MetaResult<SecretFlags> {
    let entry = secret_entry(field)?;
    setting
        .key_password(field)
        .map(|slot| slot.flags())
        .ok_or_else(|| MetaError::NotFound(format!("setting does not carry '{}'", entry.key)))
}

pub fn set_secret_flags<S: CredentialHolder + ?Sized>(
    field: CredentialField,
    setting: &mut S,
    flags: SecretFlags,
) -> MetaResult<()> {
    let entry = secret_entry(field)?;
    let slot = setting
        .key_password_mut(field)
        .ok_or_else(|| MetaError::NotFound(format!("setting does not carry '{}'", entry.key)))?;
    slot.set_flags(flags);
    Ok(())
}

/// Password protecting `field`, if one is stored
pub fn password<S: CredentialHolder + ?Sized>(
    field: CredentialField,
    setting: &S,
) -> MetaResult<Option<&str>> {
    let entry = secret_entry(field)?;
    setting
        .key_password(field)
        .map(|slot| slot.password())
        .ok_or_else(|| MetaError::NotFound(format!("setting does not carry '{}'", entry.key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_indexed_by_field() {
        for (idx, entry) in CREDENTIAL_FIELDS.iter().enumerate() {
            assert_eq!(entry.field as usize, idx);
        }
        assert_eq!(entries().count(), 6);
    }

    #[test]
    fn test_lookup_by_key() {
        for field in CredentialField::ALL {
            let entry = lookup_by_key(field.key()).unwrap();
            assert_eq!(entry.field, field);
        }
        assert!(lookup_by_key("").is_none());
        assert!(lookup_by_key("CA-CERT").is_none());
        assert!(lookup_by_key("private-key-password").is_none());
    }

    #[test]
    fn test_only_private_keys_are_secret() {
        let secret: Vec<_> = entries().filter(|e| e.is_secret).map(|e| e.key).collect();
        assert_eq!(secret, ["private-key", "phase2-private-key"]);

        for entry in entries() {
            assert_eq!(entry.password_key.is_some(), entry.is_secret);
            assert_eq!(entry.password_flags_key.is_some(), entry.is_secret);
        }
    }

    #[test]
    fn test_companions_are_client_certs() {
        assert_eq!(CredentialField::PrivateKey.entry().companion, Some(CredentialField::ClientCert));
        assert_eq!(
            CredentialField::Phase2PrivateKey.entry().companion,
            Some(CredentialField::Phase2ClientCert)
        );
    }

    #[test]
    fn test_prepare_rejects_mismatched_scheme() {
        let entry = CredentialField::CaCert.entry();
        assert!(matches!(prepare(entry, b"", SchemeTag::Path), Err(MetaError::InvalidScheme(_))));
        assert!(matches!(
            prepare(entry, b"/etc/ca.pem", SchemeTag::Uri),
            Err(MetaError::InvalidScheme(_))
        ));
        assert!(matches!(
            prepare(entry, b"/etc/ca.pem", SchemeTag::None),
            Err(MetaError::InvalidScheme(_))
        ));
    }
}
