//! Input validation
//!
//! Shape checks applied before anything is stored on a setting instance

use crate::error::{MetaError, MetaResult};

/// Maximum length for setting names
const MAX_SETTING_NAME_LEN: usize = 64;

/// Maximum length for credential paths (Linux PATH_MAX)
const MAX_CREDENTIAL_PATH_LEN: usize = 4096;

/// URI scheme for PKCS#11 objects (RFC 7512)
pub const PKCS11_URI_PREFIX: &str = "pkcs11:";

/// Path attributes defined by RFC 7512
const PKCS11_PATH_ATTRIBUTES: &[&str] = &[
    "id",
    "library-description",
    "library-manufacturer",
    "library-version",
    "manufacturer",
    "model",
    "object",
    "serial",
    "slot-description",
    "slot-id",
    "slot-manufacturer",
    "token",
    "type",
];

/// Query attributes defined by RFC 7512
const PKCS11_QUERY_ATTRIBUTES: &[&str] = &["module-name", "module-path", "pin-source", "pin-value"];

/// Object classes accepted for the "type" attribute
const PKCS11_OBJECT_TYPES: &[&str] = &["cert", "data", "private", "public", "secret-key"];

/// Validate a setting name
///
/// Setting names are lowercase ASCII letters, digits and dashes
pub fn validate_setting_name(name: &str) -> MetaResult<()> {
    if name.is_empty() {
        return Err(MetaError::InvalidParameter(
            "Setting name cannot be empty".to_string()
        ));
    }

    if name.len() > MAX_SETTING_NAME_LEN {
        return Err(MetaError::InvalidParameter(
            format!("Setting name too long (max {} characters)", MAX_SETTING_NAME_LEN)
        ));
    }

    for c in name.chars() {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
            return Err(MetaError::InvalidParameter(
                format!("Invalid setting name '{}': contains invalid character '{}'", name, c)
            ));
        }
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(MetaError::InvalidParameter(
            format!("Invalid setting name '{}': cannot start or end with dash", name)
        ));
    }

    Ok(())
}

/// Validate a profile name
///
/// Profile names become file names inside the profile directory
pub fn validate_profile_name(name: &str) -> MetaResult<()> {
    if name.is_empty() {
        return Err(MetaError::InvalidParameter(
            "Profile name cannot be empty".to_string()
        ));
    }

    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(MetaError::InvalidParameter(
            format!("Invalid profile name '{}': must not contain path separators or '..'", name)
        ));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(MetaError::InvalidParameter(
            format!("Invalid profile name '{}': contains control characters", name)
        ));
    }

    Ok(())
}

/// Validate a path-scheme credential value and return it as a string
pub fn validate_credential_path(value: &[u8]) -> MetaResult<&str> {
    if value.is_empty() {
        return Err(MetaError::InvalidScheme(
            "Certificate path cannot be empty".to_string()
        ));
    }

    if value.len() > MAX_CREDENTIAL_PATH_LEN {
        return Err(MetaError::InvalidScheme(
            format!("Certificate path too long (max {} bytes)", MAX_CREDENTIAL_PATH_LEN)
        ));
    }

    let path = std::str::from_utf8(value)
        .map_err(|_| MetaError::InvalidScheme("Certificate path is not valid UTF-8".to_string()))?;

    // Also rejects NUL
    if path.chars().any(|c| c.is_control()) {
        return Err(MetaError::InvalidScheme(
            "Certificate path contains control characters".to_string()
        ));
    }

    if path.starts_with(PKCS11_URI_PREFIX) {
        return Err(MetaError::InvalidScheme(
            format!("'{}' is a PKCS#11 URI, not a path", path)
        ));
    }

    Ok(path)
}

/// A parsed PKCS#11 URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkcs11Uri {
    /// Path attributes in URI order, percent-decoded
    pub path: Vec<(String, String)>,
    /// Query attributes in URI order, percent-decoded
    pub query: Vec<(String, String)>,
}

impl Pkcs11Uri {
    /// Look up a path attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up a query attribute
    pub fn query_attribute(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum UriComponent {
    Path,
    Query,
}

/// Parse a PKCS#11 URI (RFC 7512)
pub fn parse_pkcs11_uri(uri: &str) -> MetaResult<Pkcs11Uri> {
    let rest = uri.strip_prefix(PKCS11_URI_PREFIX).ok_or_else(|| {
        MetaError::InvalidScheme(format!("URI must start with '{}'", PKCS11_URI_PREFIX))
    })?;

    if rest.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(MetaError::InvalidScheme(
            "PKCS#11 URI contains whitespace or control characters".to_string()
        ));
    }

    let (path_part, query_part) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let path = parse_attributes(path_part, ';', UriComponent::Path)?;
    let query = match query_part {
        Some(query) => parse_attributes(query, '&', UriComponent::Query)?,
        None => Vec::new(),
    };

    if let Some((_, object_type)) = path.iter().find(|(name, _)| name == "type") {
        if !PKCS11_OBJECT_TYPES.contains(&object_type.as_str()) {
            return Err(MetaError::InvalidScheme(
                format!("Invalid PKCS#11 object type '{}'", object_type)
            ));
        }
    }

    Ok(Pkcs11Uri { path, query })
}

fn parse_attributes(
    input: &str,
    separator: char,
    component: UriComponent,
) -> MetaResult<Vec<(String, String)>> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    if input.is_empty() {
        return Ok(attributes);
    }

    for attr in input.split(separator) {
        let (name, raw_value) = attr.split_once('=').ok_or_else(|| {
            MetaError::InvalidScheme(format!("PKCS#11 attribute '{}' has no value", attr))
        })?;

        let known = match component {
            UriComponent::Path => PKCS11_PATH_ATTRIBUTES,
            UriComponent::Query => PKCS11_QUERY_ATTRIBUTES,
        };
        let vendor = name.len() > 2
            && name.starts_with("x-")
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !known.contains(&name) && !vendor {
            return Err(MetaError::InvalidScheme(
                format!("Unknown PKCS#11 attribute '{}'", name)
            ));
        }

        if component == UriComponent::Path && attributes.iter().any(|(existing, _)| existing == name) {
            return Err(MetaError::InvalidScheme(
                format!("Duplicate PKCS#11 attribute '{}'", name)
            ));
        }

        let value = percent_decode(raw_value, component)?;
        attributes.push((name.to_string(), value));
    }

    Ok(attributes)
}

fn is_value_char(c: u8, component: UriComponent) -> bool {
    if c.is_ascii_alphanumeric() || b"-._~:[]@!$'()*+,=".contains(&c) {
        return true;
    }
    match component {
        UriComponent::Path => c == b'&',
        UriComponent::Query => b"/?|".contains(&c),
    }
}

fn percent_decode(value: &str, component: UriComponent) -> MetaResult<String> {
    let bytes = value.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3);
                if !escape.is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit)) {
                    return Err(MetaError::InvalidScheme(
                        format!("Invalid percent-encoding in '{}'", value)
                    ));
                }
                i += 3;
            }
            c if is_value_char(c, component) => i += 1,
            c => {
                return Err(MetaError::InvalidScheme(
                    format!("Invalid character '{}' in PKCS#11 attribute value", c as char)
                ));
            }
        }
    }

    let decoded = urlencoding::decode(value)
        .map_err(|_| MetaError::InvalidScheme("PKCS#11 attribute is not valid UTF-8".to_string()))?;

    if decoded.chars().any(|c| c.is_control()) {
        return Err(MetaError::InvalidScheme(
            format!("PKCS#11 attribute '{}' decodes to control characters", value)
        ));
    }

    Ok(decoded.into_owned())
}
