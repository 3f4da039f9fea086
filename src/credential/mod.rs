//! 802.1x credential scheme registry
//!
//! Certificate and private-key fields can hold an on-disk path, an inline
//! blob or a PKCS#11 URI. Callers read and write them through the registry
//! without knowing which representation is active.

pub mod detect;
pub mod ieee8021x;
pub mod keyfile;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use ieee8021x::Setting8021x;
pub use keyfile::{blob_file_name, decode_keyfile_value, encode_keyfile_value};
pub use registry::{
    active_scheme, entries, format, lookup_by_key, password, read, secret_flags, set_secret_flags,
    write, CredentialFieldEntry, CREDENTIAL_FIELDS,
};

/// One certificate or private-key slot of an 802.1x setting
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialField {
    CaCert,
    Phase2CaCert,
    ClientCert,
    Phase2ClientCert,
    PrivateKey,
    Phase2PrivateKey,
    /// Sentinel for a field that could not be identified
    Unknown,
}

impl CredentialField {
    /// The six real fields, in table order
    pub const ALL: [CredentialField; 6] = [
        CredentialField::CaCert,
        CredentialField::Phase2CaCert,
        CredentialField::ClientCert,
        CredentialField::Phase2ClientCert,
        CredentialField::PrivateKey,
        CredentialField::Phase2PrivateKey,
    ];

    /// Table entry for this field
    pub fn entry(self) -> &'static CredentialFieldEntry {
        &CREDENTIAL_FIELDS[self as usize]
    }

    /// Setting key, empty for the sentinel
    pub fn key(self) -> &'static str {
        self.entry().key
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialField::Unknown => f.pad("unknown"),
            field => f.pad(field.key()),
        }
    }
}

/// What a credential field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    CaCertificate,
    ClientCertificate,
    PrivateKey,
    Unknown,
}

/// Storage scheme of a credential field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeTag {
    None,
    Path,
    Blob,
    Uri,
    Unknown,
}

impl SchemeTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemeTag::None => "none",
            SchemeTag::Path => "path",
            SchemeTag::Blob => "blob",
            SchemeTag::Uri => "uri",
            SchemeTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SchemeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Encoding of a stored certificate or key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialFormat {
    #[default]
    Unknown,
    X509,
    RawKey,
    Pkcs12,
}

impl CredentialFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            CredentialFormat::Unknown => "unknown",
            CredentialFormat::X509 => "x509",
            CredentialFormat::RawKey => "raw-key",
            CredentialFormat::Pkcs12 => "pkcs12",
        }
    }
}

impl fmt::Display for CredentialFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

bitflags::bitflags! {
    /// Policy for how a secret may be requested or persisted.
    ///
    /// The empty set means the secret is owned and stored by the system.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SecretFlags: u32 {
        /// A user secret agent provides the secret
        const AGENT_OWNED = 0x1;
        /// The secret is never persisted
        const NOT_SAVED = 0x2;
        /// The secret is optional
        const NOT_REQUIRED = 0x4;
    }
}

impl SecretFlags {
    pub const NONE: SecretFlags = SecretFlags::empty();

    /// Whether the secret is kept outside the profile
    pub fn stored_externally(self) -> bool {
        self.intersects(SecretFlags::AGENT_OWNED | SecretFlags::NOT_SAVED)
    }
}

/// Borrowed view of a credential field's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialValue<'a> {
    None,
    Path(&'a str),
    Blob(&'a [u8]),
    Uri(&'a str),
}

impl CredentialValue<'_> {
    pub fn scheme(&self) -> SchemeTag {
        match self {
            CredentialValue::None => SchemeTag::None,
            CredentialValue::Path(_) => SchemeTag::Path,
            CredentialValue::Blob(_) => SchemeTag::Blob,
            CredentialValue::Uri(_) => SchemeTag::Uri,
        }
    }
}

/// Owned storage of a credential field; exactly one representation at a time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialStore {
    #[default]
    None,
    Path(String),
    Blob(Vec<u8>),
    Uri(String),
}

impl CredentialStore {
    pub fn scheme(&self) -> SchemeTag {
        self.as_value().scheme()
    }

    pub fn as_value(&self) -> CredentialValue<'_> {
        match self {
            CredentialStore::None => CredentialValue::None,
            CredentialStore::Path(path) => CredentialValue::Path(path),
            CredentialStore::Blob(data) => CredentialValue::Blob(data),
            CredentialStore::Uri(uri) => CredentialValue::Uri(uri),
        }
    }
}

/// A certificate or key slot: stored value plus its detected encoding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential {
    store: CredentialStore,
    format: CredentialFormat,
}

impl Credential {
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn format(&self) -> CredentialFormat {
        self.format
    }

    pub fn scheme(&self) -> SchemeTag {
        self.store.scheme()
    }

    /// Replace the stored representation wholesale
    pub(crate) fn replace(&mut self, store: CredentialStore, format: CredentialFormat) {
        self.store = store;
        self.format = format;
    }

    pub(crate) fn clear(&mut self) {
        self.replace(CredentialStore::None, CredentialFormat::Unknown);
    }
}

/// Decryption passphrase of a private key and its secret policy
#[derive(Clone, PartialEq, Eq, Default)]
pub struct KeyPassword {
    password: Option<String>,
    flags: SecretFlags,
}

impl KeyPassword {
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn flags(&self) -> SecretFlags {
        self.flags
    }

    pub(crate) fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    pub(crate) fn set_flags(&mut self, flags: SecretFlags) {
        self.flags = flags;
    }
}

impl fmt::Debug for KeyPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPassword")
            .field("password", &self.password.as_ref().map(|_| "<hidden>"))
            .field("flags", &self.flags)
            .finish()
    }
}

/// Slot access a setting implementation provides for its credential fields.
///
/// Returning `None` means the implementation does not carry that field.
pub trait CredentialHolder {
    fn credential(&self, field: CredentialField) -> Option<&Credential>;

    fn credential_mut(&mut self, field: CredentialField) -> Option<&mut Credential>;

    /// Password slot; only private-key fields have one
    fn key_password(&self, field: CredentialField) -> Option<&KeyPassword>;

    fn key_password_mut(&mut self, field: CredentialField) -> Option<&mut KeyPassword>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_scheme_is_exclusive() {
        let mut credential = Credential::default();
        assert_eq!(credential.scheme(), SchemeTag::None);

        credential.replace(CredentialStore::Path("/etc/ca.pem".into()), CredentialFormat::X509);
        assert_eq!(credential.scheme(), SchemeTag::Path);

        credential.replace(CredentialStore::Blob(vec![1, 2, 3]), CredentialFormat::X509);
        assert_eq!(credential.scheme(), SchemeTag::Blob);
        assert_eq!(credential.store().as_value(), CredentialValue::Blob(&[1, 2, 3]));

        credential.clear();
        assert_eq!(credential.scheme(), SchemeTag::None);
        assert_eq!(credential.format(), CredentialFormat::Unknown);
    }

    #[test]
    fn test_secret_flags() {
        assert!(SecretFlags::NONE.is_empty());
        assert!(!SecretFlags::NONE.stored_externally());
        assert!(SecretFlags::AGENT_OWNED.stored_externally());
        assert!(SecretFlags::NOT_SAVED.stored_externally());
        assert!(!SecretFlags::NOT_REQUIRED.stored_externally());
        assert_eq!(SecretFlags::from_bits(0x8), None);
        assert_eq!(SecretFlags::from_bits(0x3), Some(SecretFlags::AGENT_OWNED | SecretFlags::NOT_SAVED));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let mut password = KeyPassword::default();
        password.set_password(Some("hunter22".into()));
        let debug = format!("{:?}", password);
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("<hidden>"));
    }

    #[test]
    fn test_field_display() {
        assert_eq!(CredentialField::Phase2PrivateKey.to_string(), "phase2-private-key");
        assert_eq!(CredentialField::Unknown.to_string(), "unknown");
    }
}
