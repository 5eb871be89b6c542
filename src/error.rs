//! Error handling for the mining simulator
//!
//! Every failure is scoped to the call that caused it. Nothing here is
//! retryable: digest computation is pure and cannot transiently fail.

use thiserror::Error;

/// Result type alias for mining simulator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mining simulator
#[derive(Error, Debug)]
pub enum Error {
    /// A header field or buffer received bytes of the wrong length
    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Operations invoked in an invalid combination
    #[error("Misuse: {message}")]
    Misuse { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Hex decoding errors
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an invalid field length error
    pub fn invalid_field_length(field: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidFieldLength {
            field,
            expected,
            actual,
        }
    }

    /// Create a misuse error
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidFieldLength { .. } => "invalid_field_length",
            Error::Misuse { .. } => "misuse",
            Error::Config { .. } => "config",
            Error::Hex(_) => "hex",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_length_message() {
        let err = Error::invalid_field_length("previous_hash", 32, 31);
        assert_eq!(
            err.to_string(),
            "Invalid length for previous_hash: expected 32 bytes, got 31"
        );
        assert_eq!(err.category(), "invalid_field_length");
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: Error = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.category(), "hex");
    }

    #[test]
    fn test_misuse_error() {
        let err = Error::misuse("scheduler has been shut down");
        assert!(matches!(err, Error::Misuse { .. }));
        assert_eq!(err.to_string(), "Misuse: scheduler has been shut down");
    }
}
