//! Certificate and private-key encoding detection
//!
//! Classification only looks at container framing (PEM armor labels and the
//! outer DER structure). Nothing is decrypted or fully parsed.

use super::{CredentialFormat, CredentialKind};
use crate::error::{MetaError, MetaResult};
use std::path::Path;

const PEM_BEGIN: &[u8] = b"-----BEGIN ";
const PEM_PROC_TYPE: &str = "Proc-Type";
const PEM_PROC_TYPE_ENCRYPTED: &str = "4,ENCRYPTED";

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// Result of classifying a credential value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub format: CredentialFormat,
    /// Whether decrypting the value requires a passphrase
    pub needs_password: bool,
}

impl Detected {
    const fn plain(format: CredentialFormat) -> Self {
        Self {
            format,
            needs_password: false,
        }
    }

    const fn encrypted(format: CredentialFormat) -> Self {
        Self {
            format,
            needs_password: true,
        }
    }
}

/// Classify inline bytes for a field of the given kind
pub fn detect_blob(kind: CredentialKind, data: &[u8]) -> MetaResult<Detected> {
    if data.is_empty() {
        return Err(MetaError::InvalidScheme("Certificate blob cannot be empty".to_string()));
    }

    if let Some(block) = pem_block(data) {
        let block = block?;
        let label = block.tag();
        return match kind {
            CredentialKind::CaCertificate | CredentialKind::ClientCertificate => {
                match label {
                    "CERTIFICATE" | "TRUSTED CERTIFICATE" | "X509 CERTIFICATE" => {
                        Ok(Detected::plain(CredentialFormat::X509))
                    }
                    other => Err(MetaError::InvalidFormat(format!(
                        "PEM block '{}' is not a certificate",
                        other
                    ))),
                }
            }
            CredentialKind::PrivateKey => match label {
                "ENCRYPTED PRIVATE KEY" => Ok(Detected::encrypted(CredentialFormat::RawKey)),
                "PRIVATE KEY" => Ok(Detected::plain(CredentialFormat::RawKey)),
                "RSA PRIVATE KEY" | "DSA PRIVATE KEY" | "EC PRIVATE KEY" => Ok(Detected {
                    format: CredentialFormat::RawKey,
                    needs_password: block
                        .headers()
                        .get(PEM_PROC_TYPE)
                        .is_some_and(|value| value.trim() == PEM_PROC_TYPE_ENCRYPTED),
                }),
                other => Err(MetaError::InvalidFormat(format!(
                    "PEM block '{}' is not a private key",
                    other
                ))),
            },
            CredentialKind::Unknown => Err(unrecognized()),
        };
    }

    let body = der_sequence_body(data).ok_or_else(unrecognized)?;

    if body.starts_with(&[DER_INTEGER, 0x01, 0x03]) {
        // PFX version 3
        return match kind {
            CredentialKind::ClientCertificate | CredentialKind::PrivateKey => {
                Ok(Detected::encrypted(CredentialFormat::Pkcs12))
            }
            _ => Err(MetaError::InvalidFormat(
                "PKCS#12 is not accepted for CA certificates".to_string(),
            )),
        };
    }

    match kind {
        CredentialKind::CaCertificate | CredentialKind::ClientCertificate => {
            if body.first() == Some(&DER_SEQUENCE) {
                Ok(Detected::plain(CredentialFormat::X509))
            } else {
                Err(unrecognized())
            }
        }
        CredentialKind::PrivateKey => {
            if body.starts_with(&[DER_INTEGER, 0x01, 0x00]) || body.starts_with(&[DER_INTEGER, 0x01, 0x01]) {
                // PKCS#1, PKCS#8 or SEC1
                Ok(Detected::plain(CredentialFormat::RawKey))
            } else if body.first() == Some(&DER_SEQUENCE) {
                // EncryptedPrivateKeyInfo
                Ok(Detected::encrypted(CredentialFormat::RawKey))
            } else {
                Err(unrecognized())
            }
        }
        CredentialKind::Unknown => Err(unrecognized()),
    }
}

/// Classify a path-scheme value by its file extension
pub fn detect_path(kind: CredentialKind, path: &str) -> MetaResult<Detected> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let detected = match (kind, extension.as_deref()) {
        (CredentialKind::CaCertificate, Some("p12" | "pfx")) => {
            return Err(MetaError::InvalidFormat(
                "PKCS#12 is not accepted for CA certificates".to_string(),
            ));
        }
        (_, Some("p12" | "pfx")) => Detected::encrypted(CredentialFormat::Pkcs12),
        (
            CredentialKind::CaCertificate | CredentialKind::ClientCertificate,
            Some("pem" | "crt" | "cer" | "der"),
        ) => Detected::plain(CredentialFormat::X509),
        (CredentialKind::PrivateKey, Some("pem" | "key" | "der")) => {
            Detected::plain(CredentialFormat::RawKey)
        }
        _ => Detected::plain(CredentialFormat::Unknown),
    };

    Ok(detected)
}

fn unrecognized() -> MetaError {
    MetaError::InvalidFormat("data matches no supported certificate or key encoding".to_string())
}

/// First PEM block, if `data` carries PEM armour at all.
///
/// Armour that does not parse, or a block with an empty body, is an error.
fn pem_block(data: &[u8]) -> Option<MetaResult<pem::Pem>> {
    if !data.windows(PEM_BEGIN.len()).any(|window| window == PEM_BEGIN) {
        return None;
    }

    let parsed = pem::parse(data)
        .map_err(|e| MetaError::InvalidFormat(format!("malformed PEM block: {}", e)))
        .and_then(|block| {
            if block.contents().is_empty() {
                Err(MetaError::InvalidFormat(format!(
                    "PEM block '{}' has no body",
                    block.tag()
                )))
            } else {
                Ok(block)
            }
        });
    Some(parsed)
}

/// Contents of an outer DER SEQUENCE, if `data` starts with one
fn der_sequence_body(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 2 || data[0] != DER_SEQUENCE {
        return None;
    }

    let (len, header) = match data[1] {
        short if short < 0x80 => (short as usize, 2),
        long @ 0x81..=0x84 => {
            let count = (long & 0x7f) as usize;
            let octets = data.get(2..2 + count)?;
            let len = octets.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
            (len, 2 + count)
        }
        _ => return None,
    };

    data.get(header..header.checked_add(len)?)
}
