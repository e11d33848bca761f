//! Error types for configuration loading.
//!
//! Covers file access, YAML parsing, malformed environment overrides and
//! values that fail validation.

use thiserror::Error;

/// Errors that can occur while loading or validating a [`DatabaseConfig`](crate::DatabaseConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: '{value}'")]
    InvalidOverride { var: &'static str, value: String },

    /// A field holds a value the store cannot work with.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
