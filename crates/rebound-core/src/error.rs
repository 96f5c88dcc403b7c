//! Error types for rebound-core

use thiserror::Error;

/// Result type alias using rebound-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Rebound
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// Retry policy violates its constraints
    #[error("Invalid retry policy: {message}")]
    InvalidPolicy { message: String },

    /// Unknown per-operation policy
    #[error("No retry policy configured for operation: {operation}")]
    UnknownOperation { operation: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid policy error
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }

    /// Create an unknown operation error
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_policy_display() {
        let err = Error::invalid_policy("max-attempts must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid retry policy: max-attempts must be at least 1"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
