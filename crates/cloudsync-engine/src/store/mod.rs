//! Record stores
//!
//! The writer hands a store fully prepared rows: surrogate keys assigned,
//! parent keys filled in, tables ordered parents first. A store only has to
//! delete by partition (cascading to owned children) and insert chunks.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::partition::PartitionScope;
use crate::record::Row;
use crate::schema::TableSchema;

pub use memory::{MemoryStore, StoredRow};
pub use postgres::PgRecordStore;

/// A row ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub row_id: Uuid,
    /// Set on child rows only
    pub parent_row_id: Option<Uuid>,
    pub row: Row,
}

/// All rows of one table within a chunk
#[derive(Debug, Clone)]
pub struct TableRows {
    pub table: TableSchema,
    /// Parent table name; `None` for the resource's root table
    pub parent: Option<&'static str>,
    /// Partition columns carried by root rows, empty for children
    pub partition_columns: &'static [&'static str],
    pub rows: Vec<PreparedRow>,
}

impl TableRows {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Insert column order: keys, partition columns, then declared columns
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = vec![crate::schema::ROW_ID_COLUMN];
        if !self.is_root() {
            names.push(crate::schema::PARENT_ROW_ID_COLUMN);
        }
        names.extend_from_slice(self.partition_columns);
        names.extend(self.table.columns.iter().map(|c| c.name));
        names
    }
}

/// Unit of insertion: a bounded number of roots with all their descendants
///
/// `tables` is ordered parents before children so foreign keys resolve when
/// tables are inserted front to back.
#[derive(Debug, Clone, Default)]
pub struct WriteChunk {
    pub tables: Vec<TableRows>,
}

impl WriteChunk {
    pub fn root_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| t.is_root())
            .map(|t| t.rows.len())
            .sum()
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Persistence backend used by the relational writer
///
/// Shared between concurrently running pipelines, so implementations must be
/// safe to call from several tasks at once. Deletes and inserts of the same
/// partition are not isolated from each other; callers serialize those.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the resource's tables if they do not exist
    async fn ensure_schema(
        &self,
        table: &TableSchema,
        scope: PartitionScope,
    ) -> Result<(), StoreError>;

    /// Delete every root row of `table` matching `partition`, together with
    /// all rows its child tables own. Returns the number of root rows removed.
    async fn delete_partition(
        &self,
        table: &TableSchema,
        partition: &[(&'static str, &str)],
    ) -> Result<u64, StoreError>;

    /// Insert one chunk
    async fn insert_chunk(&self, chunk: &WriteChunk) -> Result<(), StoreError>;
}
