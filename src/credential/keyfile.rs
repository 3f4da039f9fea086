//! Keyfile text encoding of credential values
//!
//! Paths are written as `file://` URIs, inline blobs as base64 `data:` URIs
//! and PKCS#11 URIs verbatim.

use super::{CredentialField, CredentialFormat, CredentialValue, SchemeTag};
use crate::error::{MetaError, MetaResult};
use crate::validation::PKCS11_URI_PREFIX;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use uuid::Uuid;

pub const FILE_URI_PREFIX: &str = "file://";
pub const DATA_URI_PREFIX: &str = "data:;base64,";

/// Text form of a credential value; `None` when the field is empty
pub fn encode_keyfile_value(value: CredentialValue<'_>) -> Option<String> {
    match value {
        CredentialValue::None => None,
        CredentialValue::Path(path) => Some(format!("{}{}", FILE_URI_PREFIX, path)),
        CredentialValue::Blob(data) => Some(format!("{}{}", DATA_URI_PREFIX, BASE64.encode(data))),
        CredentialValue::Uri(uri) => Some(uri.to_string()),
    }
}

/// Scheme and raw bytes of a keyfile credential value.
///
/// Bare paths are accepted; relative ones are resolved against `base_dir`.
pub fn decode_keyfile_value(text: &str, base_dir: Option<&Path>) -> MetaResult<(SchemeTag, Vec<u8>)> {
    if let Some(encoded) = text.strip_prefix(DATA_URI_PREFIX) {
        let data = BASE64.decode(encoded.trim())?;
        return Ok((SchemeTag::Blob, data));
    }

    if text.starts_with(PKCS11_URI_PREFIX) {
        return Ok((SchemeTag::Uri, text.as_bytes().to_vec()));
    }

    let path = text.strip_prefix(FILE_URI_PREFIX).unwrap_or(text);
    if path.is_empty() {
        return Err(MetaError::InvalidScheme("empty certificate path".to_string()));
    }

    let path = match base_dir {
        Some(base) if Path::new(path).is_relative() => base.join(path).to_string_lossy().into_owned(),
        _ => path.to_string(),
    };

    Ok((SchemeTag::Path, path.into_bytes()))
}

/// File name for an externalised blob: `<uuid>-<suffix>.<ext>`
pub fn blob_file_name(uuid: &Uuid, field: CredentialField, format: CredentialFormat) -> String {
    let extension = match format {
        CredentialFormat::X509 | CredentialFormat::RawKey => "pem",
        CredentialFormat::Pkcs12 => "p12",
        CredentialFormat::Unknown => "bin",
    };
    format!("{}-{}.{}", uuid, field.entry().file_suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_encode() {
        assert_eq!(encode_keyfile_value(CredentialValue::None), None);
        assert_eq!(
            encode_keyfile_value(CredentialValue::Path("/etc/pki/ca.pem")).as_deref(),
            Some("file:///etc/pki/ca.pem")
        );
        assert_eq!(
            encode_keyfile_value(CredentialValue::Blob(b"abc")).as_deref(),
            Some("data:;base64,YWJj")
        );
        assert_eq!(
            encode_keyfile_value(CredentialValue::Uri("pkcs11:object=ca")).as_deref(),
            Some("pkcs11:object=ca")
        );
    }

    #[test]
    fn test_decode() {
        let (scheme, data) = decode_keyfile_value("data:;base64,YWJj", None).unwrap();
        assert_eq!(scheme, SchemeTag::Blob);
        assert_eq!(data, b"abc");

        let (scheme, data) = decode_keyfile_value("file:///etc/pki/ca.pem", None).unwrap();
        assert_eq!(scheme, SchemeTag::Path);
        assert_eq!(data, b"/etc/pki/ca.pem");

        let (scheme, data) = decode_keyfile_value("/etc/pki/ca.pem", None).unwrap();
        assert_eq!(scheme, SchemeTag::Path);
        assert_eq!(data, b"/etc/pki/ca.pem");

        let (scheme, _) = decode_keyfile_value("pkcs11:token=t;object=o", None).unwrap();
        assert_eq!(scheme, SchemeTag::Uri);
    }

    #[test]
    fn test_decode_relative_path() {
        let base = PathBuf::from("/etc/netctl/profiles");
        let (scheme, data) = decode_keyfile_value("certs/ca.pem", Some(&base)).unwrap();
        assert_eq!(scheme, SchemeTag::Path);
        assert_eq!(data, b"/etc/netctl/profiles/certs/ca.pem");

        let (_, data) = decode_keyfile_value("/abs/ca.pem", Some(&base)).unwrap();
        assert_eq!(data, b"/abs/ca.pem");
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        assert!(matches!(
            decode_keyfile_value("data:;base64,@@@", None),
            Err(MetaError::InvalidScheme(_))
        ));
        assert!(decode_keyfile_value("file://", None).is_err());
        assert!(decode_keyfile_value("", None).is_err());
    }

    #[test]
    fn test_blob_file_name() {
        let uuid = Uuid::parse_str("6b1b3f5e-0d55-4a1c-9a7e-3d1f2b4c5a6d").unwrap();
        assert_eq!(
            blob_file_name(&uuid, CredentialField::Phase2CaCert, CredentialFormat::X509),
            "6b1b3f5e-0d55-4a1c-9a7e-3d1f2b4c5a6d-inner-ca-cert.pem"
        );
        assert_eq!(
            blob_file_name(&uuid, CredentialField::PrivateKey, CredentialFormat::Pkcs12),
            "6b1b3f5e-0d55-4a1c-9a7e-3d1f2b4c5a6d-private-key.p12"
        );
    }
}
