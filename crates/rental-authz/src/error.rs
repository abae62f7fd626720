//! Error types for the authorization engine.
//!
//! Only configuration problems and caller contract violations are errors.
//! Access-control outcomes (unknown role, missing grant, unknown filter type)
//! are plain `false`/deny answers and never show up here.

use thiserror::Error;

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Errors raised by the authorization engine.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Configuration file could not be parsed.
    #[error("Failed to parse authorization config: {0}")]
    ParseError(String),

    /// Configuration parsed but is not acceptable.
    #[error("Authorization config validation error: {0}")]
    ValidationError(String),

    /// A required argument was not supplied by the caller.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// Data handed to a filtering entry point was not an array.
    #[error("Expected an array of records, got {0}")]
    NotAnArray(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(String),

    /// Canonicalization error.
    #[error("Canonicalization error: {0}")]
    CanonicalizationError(String),
}

impl From<serde_json::Error> for AuthzError {
    fn from(err: serde_json::Error) -> Self {
        AuthzError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AuthzError {
    fn from(err: serde_yaml::Error) -> Self {
        AuthzError::ParseError(err.to_string())
    }
}

impl From<regex::Error> for AuthzError {
    fn from(err: regex::Error) -> Self {
        AuthzError::ValidationError(format!("Invalid token pattern: {}", err))
    }
}

impl From<std::io::Error> for AuthzError {
    fn from(err: std::io::Error) -> Self {
        AuthzError::Io(err.to_string())
    }
}
