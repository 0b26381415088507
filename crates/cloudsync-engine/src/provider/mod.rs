//! Provider list capability
//!
//! The engine treats the cloud provider as one generic capability: list a
//! page of items for an operation and return the continuation cursor. How
//! that call is made (SDK, gateway, fixture) is up to the implementation.

pub mod http;

use async_trait::async_trait;

use crate::descriptor::ListOperation;
use crate::error::ProviderError;
use crate::partition::PartitionKey;

pub use http::{HttpListProvider, HttpProviderConfig};

/// One provider response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOutput {
    pub items: Vec<serde_json::Value>,
    /// Empty or absent means the listing is complete
    pub next_cursor: Option<String>,
}

/// List items with a continuation token
///
/// Implementations must be safe to share between concurrently running
/// pipelines. Timeouts belong to the implementation; the engine adds no
/// retries on top.
#[async_trait]
pub trait ListProvider: Send + Sync {
    async fn list(
        &self,
        operation: &ListOperation,
        partition: &PartitionKey,
        params: &serde_json::Value,
    ) -> Result<ListOutput, ProviderError>;
}
