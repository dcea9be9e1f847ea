//! Core error types for the Trawl engine.
//!
//! This module defines the central error type shared across crates. Per-source
//! failures are never represented here; they are data in the scanner's
//! `ProbeOutcome`. Only errors that prevent a run from starting surface as
//! [`TrawlError`].

use thiserror::Error;

/// Central error type for Trawl operations.
#[derive(Error, Debug)]
pub enum TrawlError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (platform base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `TrawlError`.
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrawlError::Validation("empty source name".to_string());
        assert_eq!(err.to_string(), "validation error: empty source name");

        let err = ConfigError::InvalidValue {
            field: "scan.threads".to_string(),
            reason: "must be 2-40, got 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for scan.threads: must be 2-40, got 0"
        );
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let trawl_err: TrawlError = config_err.into();
        assert!(matches!(trawl_err, TrawlError::Config(_)));
    }

    #[test]
    fn test_invalid_input_is_validation_error() {
        let err = "altavista".parse::<crate::SearchEngine>().unwrap_err();
        assert!(matches!(err, TrawlError::Validation(_)));

        let err = crate::SourceName::new("   ").unwrap_err();
        assert!(matches!(err, TrawlError::Validation(_)));
    }
}
