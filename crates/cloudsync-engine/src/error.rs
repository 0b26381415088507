//! Error types for the synchronization engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Why a sync run failed
///
/// Every variant is surfaced to the caller of `SyncPipeline::run` or
/// `Registry::run`. The engine never retries and never rolls back writes
/// that were already committed; rerunning the sync clears and rewrites the
/// partition.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The untyped configuration could not be decoded into the resource's
    /// request. Raised before any storage mutation.
    #[error("Malformed configuration for '{resource}': {source}")]
    ConfigDecode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// The caller's cancellation token fired between two pages
    #[error("Sync of '{resource}' cancelled after {pages} page(s)")]
    Cancelled { resource: String, pages: usize },
}

impl SyncError {
    pub fn config_decode(resource: &str, source: serde_json::Error) -> Self {
        Self::ConfigDecode {
            resource: resource.to_string(),
            source,
        }
    }

    /// Short machine-friendly label, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::ConfigDecode { .. } => "config_decode",
            SyncError::Provider(_) => "provider",
            SyncError::Storage(_) => "storage",
            SyncError::UnknownResourceType(_) => "unknown_resource_type",
            SyncError::Cancelled { .. } => "cancelled",
        }
    }
}

/// Failure of a provider list call
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The typed request could not be serialized for the wire
    #[error("Invalid request parameters: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

/// Failure of a clear or write against the record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// A record does not fit the table schema it is written to
    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Database pool setup errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),
}

pub type DbResult<T> = std::result::Result<T, DbError>;
