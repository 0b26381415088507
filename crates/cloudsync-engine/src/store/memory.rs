//! In-memory record store
//!
//! Used for `--dry-run` and by the engine's behavioural tests. Enforces the
//! same foreign key and cascade rules a relational store would, and can be
//! told to fail specific calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RecordStore, WriteChunk};
use crate::error::StoreError;
use crate::partition::PartitionScope;
use crate::record::Row;
use crate::schema::TableSchema;

/// A row as held by the memory store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub row_id: Uuid,
    pub parent_row_id: Option<Uuid>,
    pub row: Row,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<&'static str, Vec<StoredRow>>,
    schemas: HashSet<&'static str>,
    insert_calls: usize,
    delete_calls: usize,
    fail_insert_call: Option<usize>,
    fail_deletes: bool,
    fail_schemas: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th `insert_chunk` call (1-based) fail
    pub async fn fail_insert_call(&self, n: usize) {
        self.state.lock().await.fail_insert_call = Some(n);
    }

    /// Make every `delete_partition` call fail
    pub async fn fail_deletes(&self) {
        self.state.lock().await.fail_deletes = true;
    }

    /// Make `ensure_schema` fail for the resource whose root table is `table`
    pub async fn fail_schema(&self, table: &str) {
        self.state.lock().await.fail_schemas.insert(table.to_string());
    }

    pub async fn rows(&self, table: &str) -> Vec<StoredRow> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .map_or(0, Vec::len)
    }

    pub async fn insert_calls(&self) -> usize {
        self.state.lock().await.insert_calls
    }

    pub async fn delete_calls(&self) -> usize {
        self.state.lock().await.delete_calls
    }

    /// Tables created through `ensure_schema`
    pub async fn has_schema(&self, table: &str) -> bool {
        self.state.lock().await.schemas.contains(table)
    }
}

fn matches_partition(row: &Row, partition: &[(&'static str, &str)]) -> bool {
    partition
        .iter()
        .all(|(column, value)| row.get(column).as_text() == Some(*value))
}

fn cascade(state: &mut State, table: &TableSchema, removed: &HashSet<Uuid>) {
    for relation in table.children {
        let child = &relation.table;
        let mut removed_children = HashSet::new();
        if let Some(rows) = state.tables.get_mut(child.name) {
            rows.retain(|r| {
                let owned = r.parent_row_id.is_some_and(|p| removed.contains(&p));
                if owned {
                    removed_children.insert(r.row_id);
                }
                !owned
            });
        }
        cascade(state, child, &removed_children);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ensure_schema(
        &self,
        table: &TableSchema,
        _scope: PartitionScope,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_schemas.contains(table.name) {
            return Err(StoreError::Unavailable(format!(
                "injected schema failure on {}",
                table.name
            )));
        }
        for t in table.walk() {
            state.schemas.insert(t.name);
        }
        Ok(())
    }

    async fn delete_partition(
        &self,
        table: &TableSchema,
        partition: &[(&'static str, &str)],
    ) -> Result<u64, StoreError> {
        if partition.is_empty() {
            return Err(StoreError::schema(format!(
                "refusing to delete from {} without partition columns",
                table.name
            )));
        }

        let mut state = self.state.lock().await;
        state.delete_calls += 1;
        if state.fail_deletes {
            return Err(StoreError::Unavailable(format!(
                "injected delete failure on {}",
                table.name
            )));
        }

        let mut removed = HashSet::new();
        if let Some(rows) = state.tables.get_mut(table.name) {
            rows.retain(|r| {
                let hit = matches_partition(&r.row, partition);
                if hit {
                    removed.insert(r.row_id);
                }
                !hit
            });
        }
        cascade(&mut *state, table, &removed);

        Ok(removed.len() as u64)
    }

    async fn insert_chunk(&self, chunk: &WriteChunk) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.insert_calls += 1;
        if state.fail_insert_call == Some(state.insert_calls) {
            return Err(StoreError::Unavailable(format!(
                "injected insert failure on call {}",
                state.insert_calls
            )));
        }

        // Stage the whole chunk first so a bad row leaves nothing behind,
        // like a rolled back transaction would
        let mut staged: HashMap<&'static str, Vec<StoredRow>> = HashMap::new();
        for table_rows in &chunk.tables {
            for prepared in &table_rows.rows {
                if let (Some(parent), Some(parent_id)) = (table_rows.parent, prepared.parent_row_id) {
                    let known = |rows: Option<&Vec<StoredRow>>| {
                        rows.is_some_and(|rows| rows.iter().any(|r| r.row_id == parent_id))
                    };
                    if !known(staged.get(parent)) && !known(state.tables.get(parent)) {
                        return Err(StoreError::schema(format!(
                            "{} row {} references missing {} row {}",
                            table_rows.table.name, prepared.row_id, parent, parent_id
                        )));
                    }
                } else if table_rows.parent.is_some() {
                    return Err(StoreError::schema(format!(
                        "{} row {} has no parent key",
                        table_rows.table.name, prepared.row_id
                    )));
                }

                staged
                    .entry(table_rows.table.name)
                    .or_default()
                    .push(StoredRow {
                        row_id: prepared.row_id,
                        parent_row_id: prepared.parent_row_id,
                        row: prepared.row.clone(),
                    });
            }
        }

        for (table, rows) in staged {
            state.tables.entry(table).or_default().extend(rows);
        }
        Ok(())
    }
}
