//! Partition-scoped clear-and-replace writer
//!
//! `clear_partition` removes a resource's root rows for one partition (child
//! rows go with them through the cascade). `write_batch` validates records
//! against the resource's table schema, assigns surrogate keys, links every
//! child to its parent's key and hands the rows to the store in chunks of at
//! most `max_chunk_size` roots. A root and its descendants always travel in
//! the same chunk.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::descriptor::ResourceDescriptor;
use crate::error::StoreError;
use crate::partition::PartitionKey;
use crate::record::{ChildRecord, Row, RootRecord};
use crate::schema::TableSchema;
use crate::store::{PreparedRow, RecordStore, TableRows, WriteChunk};

/// Default number of root records per chunk
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 100;

/// What one or more `write_batch` calls inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub root_rows: usize,
    pub child_rows: usize,
    pub chunks: usize,
}

impl WriteStats {
    pub fn absorb(&mut self, other: WriteStats) {
        self.root_rows += other.root_rows;
        self.child_rows += other.child_rows;
        self.chunks += other.chunks;
    }
}

#[derive(Clone)]
pub struct RelationalWriter {
    store: Arc<dyn RecordStore>,
    max_chunk_size: usize,
}

impl std::fmt::Debug for RelationalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalWriter")
            .field("max_chunk_size", &self.max_chunk_size)
            .finish_non_exhaustive()
    }
}

impl RelationalWriter {
    /// `max_chunk_size` of zero is treated as one
    pub fn new(store: Arc<dyn RecordStore>, max_chunk_size: usize) -> Self {
        Self {
            store,
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Create the descriptor's tables if missing
    pub async fn ensure_schema(&self, descriptor: &ResourceDescriptor) -> Result<(), StoreError> {
        self.store
            .ensure_schema(&descriptor.table, descriptor.scope)
            .await
    }

    /// Remove every stored record of this resource in `partition`
    pub async fn clear_partition(
        &self,
        descriptor: &ResourceDescriptor,
        partition: &PartitionKey,
    ) -> Result<u64, StoreError> {
        let columns = partition.columns(descriptor.scope);
        let removed = self
            .store
            .delete_partition(&descriptor.table, &columns)
            .await?;

        debug!(
            resource = descriptor.name,
            partition = %partition,
            removed,
            "Partition cleared"
        );
        Ok(removed)
    }

    /// Insert `records` and everything they own
    ///
    /// All chunks are prepared before the first insert, so a schema mismatch
    /// anywhere in the batch is reported without touching the store. A store
    /// failure on a later chunk leaves earlier chunks committed.
    pub async fn write_batch(
        &self,
        descriptor: &ResourceDescriptor,
        partition: &PartitionKey,
        records: &[RootRecord],
    ) -> Result<WriteStats, StoreError> {
        let chunks = records
            .chunks(self.max_chunk_size)
            .map(|slice| prepare_chunk(descriptor, partition, slice))
            .collect::<Result<Vec<_>, _>>()?;

        let total = chunks.len();
        let mut stats = WriteStats::default();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(
                resource = descriptor.name,
                chunk = idx + 1,
                total,
                rows = chunk.row_count(),
                "Writing chunk"
            );

            self.store.insert_chunk(chunk).await?;

            let roots = chunk.root_count();
            stats.absorb(WriteStats {
                root_rows: roots,
                child_rows: chunk.row_count() - roots,
                chunks: 1,
            });
        }

        Ok(stats)
    }
}

/// Empty per-table buckets for a resource, parents before children
fn layout(descriptor: &ResourceDescriptor) -> Vec<TableRows> {
    fn children(table: &TableSchema, out: &mut Vec<TableRows>) {
        for relation in table.children {
            out.push(TableRows {
                table: relation.table,
                parent: Some(table.name),
                partition_columns: &[],
                rows: Vec::new(),
            });
            children(&relation.table, out);
        }
    }

    let mut out = vec![TableRows {
        table: descriptor.table,
        parent: None,
        partition_columns: descriptor.scope.column_names(),
        rows: Vec::new(),
    }];
    children(&descriptor.table, &mut out);
    out
}

fn prepare_chunk(
    descriptor: &ResourceDescriptor,
    partition: &PartitionKey,
    records: &[RootRecord],
) -> Result<WriteChunk, StoreError> {
    let mut tables = layout(descriptor);
    let index: HashMap<&'static str, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.table.name, i))
        .collect();

    let partition_columns = descriptor.scope.column_names();
    for record in records {
        validate_row(&descriptor.table, &record.row, partition_columns)?;

        // Partition columns always come from the partition being written
        let mut row = record.row.clone();
        for (column, value) in partition.columns(descriptor.scope) {
            row.set(column, value);
        }

        let row_id = Uuid::new_v4();
        tables[0].rows.push(PreparedRow {
            row_id,
            parent_row_id: None,
            row,
        });

        prepare_children(
            &descriptor.table,
            row_id,
            &record.children,
            &index,
            &mut tables,
        )?;
    }

    Ok(WriteChunk { tables })
}

fn prepare_children(
    parent: &TableSchema,
    parent_row_id: Uuid,
    children: &[ChildRecord],
    index: &HashMap<&'static str, usize>,
    tables: &mut [TableRows],
) -> Result<(), StoreError> {
    for child in children {
        let schema = parent.child(child.table).ok_or_else(|| {
            StoreError::schema(format!(
                "{} is not a child table of {}",
                child.table, parent.name
            ))
        })?;
        validate_row(schema, &child.row, &[])?;

        let slot = index.get(schema.name).copied().ok_or_else(|| {
            StoreError::schema(format!("no slot for table {}", schema.name))
        })?;

        let row_id = Uuid::new_v4();
        tables[slot].rows.push(PreparedRow {
            row_id,
            parent_row_id: Some(parent_row_id),
            row: child.row.clone(),
        });

        prepare_children(schema, row_id, &child.children, index, tables)?;
    }
    Ok(())
}

fn validate_row(
    table: &TableSchema,
    row: &Row,
    partition_columns: &[&str],
) -> Result<(), StoreError> {
    for (name, value) in row.columns() {
        if partition_columns.contains(&name) {
            continue;
        }
        let column = table.column(name).ok_or_else(|| {
            StoreError::schema(format!("unknown column {}.{}", table.name, name))
        })?;
        if !value.fits(column.ty) {
            return Err(StoreError::schema(format!(
                "{}.{} expects {:?}, got {:?}",
                table.name, name, column.ty, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::{decode_request, ListOperation, PaginatedInput};
    use crate::partition::PartitionScope;
    use crate::record::Value;
    use crate::schema::{Column, Relation};
    use crate::store::MemoryStore;
    use crate::transform::map_item;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct NoInput {}

    impl PaginatedInput for NoInput {
        fn set_cursor(&mut self, _cursor: String) {}
    }

    const TAGS: TableSchema = TableSchema::new(
        "w_tags",
        &[Column::text("key", "Key"), Column::text("value", "Value")],
        &[],
    );

    static WIDGETS: ResourceDescriptor = ResourceDescriptor {
        name: "test.widgets",
        operation: ListOperation {
            service: "test",
            action: "ListWidgets",
            items_field: "Widgets",
            cursor_field: "NextToken",
        },
        scope: PartitionScope::Regional,
        table: TableSchema::new(
            "w_widgets",
            &[Column::text("widget_id", "WidgetId"), Column::bigint("size", "Size")],
            &[Relation::many("Tags", TAGS)],
        ),
        decode: decode_request::<NoInput>,
        transform: map_item,
    };

    fn widget(id: &str, tags: usize) -> RootRecord {
        let mut record = RootRecord::new(Row::new().with("widget_id", id));
        for i in 0..tags {
            record.children.push(ChildRecord::new(
                "w_tags",
                Row::new().with("key", format!("k{i}")),
            ));
        }
        record
    }

    fn writer(store: &MemoryStore, max: usize) -> RelationalWriter {
        RelationalWriter::new(Arc::new(store.clone()), max)
    }

    #[tokio::test]
    async fn test_n_plus_one_records_make_two_chunks() {
        let store = MemoryStore::new();
        let writer = writer(&store, 3);
        let partition = PartitionKey::new("1", "us-east-1");
        let records: Vec<_> = (0..4).map(|i| widget(&format!("w{i}"), 1)).collect();

        let stats = writer.write_batch(&WIDGETS, &partition, &records).await.unwrap();

        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.root_rows, 4);
        assert_eq!(stats.child_rows, 4);
        assert_eq!(store.insert_calls().await, 2);
        assert_eq!(store.row_count("w_widgets").await, 4);
        assert_eq!(store.row_count("w_tags").await, 4);
    }

    #[tokio::test]
    async fn test_children_reference_their_own_parent() {
        let store = MemoryStore::new();
        let writer = writer(&store, 10);
        let partition = PartitionKey::new("1", "us-east-1");

        writer
            .write_batch(&WIDGETS, &partition, &[widget("a", 2), widget("b", 1)])
            .await
            .unwrap();

        let roots = store.rows("w_widgets").await;
        let tags = store.rows("w_tags").await;
        let a = roots
            .iter()
            .find(|r| r.row.get("widget_id") == &Value::from("a"))
            .unwrap();
        assert_eq!(
            tags.iter().filter(|t| t.parent_row_id == Some(a.row_id)).count(),
            2
        );
        assert!(tags
            .iter()
            .all(|t| roots.iter().any(|r| Some(r.row_id) == t.parent_row_id)));
    }

    #[tokio::test]
    async fn test_partition_columns_come_from_partition() {
        let store = MemoryStore::new();
        let writer = writer(&store, 10);
        let partition = PartitionKey::new("222", "eu-west-1");
        let record = RootRecord::new(
            Row::new()
                .with("account_id", "999")
                .with("widget_id", "x"),
        );

        writer.write_batch(&WIDGETS, &partition, &[record]).await.unwrap();

        let rows = store.rows("w_widgets").await;
        assert_eq!(rows[0].row.get("account_id"), &Value::from("222"));
        assert_eq!(rows[0].row.get("region"), &Value::from("eu-west-1"));
    }

    #[tokio::test]
    async fn test_schema_mismatch_fails_before_any_insert() {
        let store = MemoryStore::new();
        let writer = writer(&store, 1);
        let partition = PartitionKey::new("1", "r");

        let bad_type = RootRecord::new(Row::new().with("size", "big"));
        let err = writer
            .write_batch(&WIDGETS, &partition, &[widget("ok", 0), bad_type])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));

        let mut bad_child = widget("c", 0);
        bad_child
            .children
            .push(ChildRecord::new("w_listeners", Row::new()));
        assert!(writer
            .write_batch(&WIDGETS, &partition, &[bad_child])
            .await
            .is_err());

        let unknown = RootRecord::new(Row::new().with("colour", "red"));
        assert!(writer
            .write_batch(&WIDGETS, &partition, &[unknown])
            .await
            .is_err());

        assert_eq!(store.insert_calls().await, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let store = MemoryStore::new();
        let writer = writer(&store, 10);
        let stats = writer
            .write_batch(&WIDGETS, &PartitionKey::new("1", "r"), &[])
            .await
            .unwrap();
        assert_eq!(stats, WriteStats::default());
        assert_eq!(store.insert_calls().await, 0);
    }

    #[tokio::test]
    async fn test_clear_removes_roots_and_cascades() {
        let store = MemoryStore::new();
        let writer = writer(&store, 10);
        let here = PartitionKey::new("1", "us-east-1");
        let there = PartitionKey::new("1", "us-west-2");

        writer.write_batch(&WIDGETS, &here, &[widget("a", 2)]).await.unwrap();
        writer.write_batch(&WIDGETS, &there, &[widget("b", 1)]).await.unwrap();

        let removed = writer.clear_partition(&WIDGETS, &here).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.row_count("w_widgets").await, 1);
        assert_eq!(store.row_count("w_tags").await, 1);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let writer = RelationalWriter::new(Arc::new(MemoryStore::new()), 0);
        assert_eq!(writer.max_chunk_size(), 1);
    }
}
