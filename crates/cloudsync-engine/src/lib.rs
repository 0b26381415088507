//! cloudsync engine
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Generic resource synchronization: page through a provider listing,
//! transform every item into relational records and replace the stored
//! records of one (account, region) partition.
//!
//! # Overview
//!
//! - **Descriptors**: each resource type is data only ([`ResourceDescriptor`]):
//!   typed request, list call, table schema, transform
//! - **Pagination**: [`pagination::fetch_all`] drives a list call until the
//!   cursor runs out
//! - **Writer**: [`RelationalWriter`] clears a partition once and inserts
//!   records in bounded chunks, children linked to their parents
//! - **Pipeline**: [`SyncPipeline`] runs one resource for one partition
//! - **Registry**: [`Registry`] resolves resource names and runs pipelines
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cloudsync_engine::{
//!     HttpListProvider, HttpProviderConfig, MemoryStore, PartitionKey, Registry,
//!     RelationalWriter, SyncContext,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let provider = HttpListProvider::new(&HttpProviderConfig::new("http://localhost:4566/list"))?;
//! let writer = RelationalWriter::new(Arc::new(MemoryStore::new()), 100);
//! let ctx = SyncContext::new(Arc::new(provider), writer);
//!
//! let report = Registry::builtin()
//!     .run(&ctx, "ec2.nat_gateways", &PartitionKey::new("123456789012", "us-east-1"), serde_json::Value::Null)
//!     .await?;
//! println!("{} items in {} pages", report.items, report.pages);
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod descriptor;
pub mod error;
pub mod pagination;
pub mod partition;
pub mod pipeline;
pub mod provider;
pub mod record;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod store;
pub mod transform;
pub mod writer;

pub use descriptor::{decode_request, ListOperation, ListRequest, PaginatedInput, ResourceDescriptor};
pub use error::{DbError, ProviderError, Result, StoreError, SyncError};
pub use pagination::{fetch_all, Page};
pub use partition::{PartitionKey, PartitionScope};
pub use pipeline::{SyncPipeline, SyncReport, SyncState};
pub use provider::{HttpListProvider, HttpProviderConfig, ListOutput, ListProvider};
pub use record::{ChildRecord, Row, RootRecord, Value};
pub use registry::{Registry, SyncContext};
pub use schema::{Cardinality, Column, ColumnType, Relation, TableSchema};
pub use store::{MemoryStore, PgRecordStore, RecordStore};
pub use transform::{map_item, TransformContext, TransformFn};
pub use writer::{RelationalWriter, WriteStats, DEFAULT_MAX_CHUNK_SIZE};
