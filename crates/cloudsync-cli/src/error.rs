//! Error types for the cloudsync CLI
//!
//! Messages are user-facing and say what to check next.

use cloudsync_engine::{DbError, ProviderError};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or config file.")]
    Config(String),

    #[error("Fetch configuration not found: '{0}'. Pass --config or set CLOUDSYNC_CONFIG.")]
    ConfigNotFound(String),

    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed
    #[error("Failed to parse YAML: {0}. Check the file syntax at the indicated line/column.")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
