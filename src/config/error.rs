//! Configuration error types.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors for configuration loading and lookup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO errors reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A requested key path is absent and no fallback was given
    #[error("configuration not found: {0}")]
    NotFound(String),

    /// Structurally invalid configuration
    #[error("configuration validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create a not found error with context
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error with context
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}
