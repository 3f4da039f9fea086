//! Error types for netctl-meta

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaError {
    /// Unknown setting name, credential key or type handle
    #[error("Not found: {0}")]
    NotFound(String),
    /// Value shape disagrees with the declared storage scheme
    #[error("Invalid scheme: {0}")]
    InvalidScheme(String),
    /// Certificate or key bytes match no supported encoding
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Encrypted private key supplied without a passphrase
    #[error("Missing password: {0}")]
    MissingPassword(String),
    /// Secret policy requested on a field that has none
    #[error("Not applicable: {0}")]
    NotApplicable(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for MetaError {
    fn from(error: serde_json::Error) -> Self {
        MetaError::ParseError(error.to_string())
    }
}

impl From<toml::de::Error> for MetaError {
    fn from(error: toml::de::Error) -> Self {
        MetaError::ParseError(error.to_string())
    }
}

impl From<base64::DecodeError> for MetaError {
    fn from(error: base64::DecodeError) -> Self {
        MetaError::InvalidScheme(format!("invalid base64 blob: {}", error))
    }
}

pub type MetaResult<T> = Result<T, MetaError>;
