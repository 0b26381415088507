//! PostgreSQL record store

use async_trait::async_trait;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{PreparedRow, RecordStore, TableRows, WriteChunk};
use crate::error::StoreError;
use crate::partition::PartitionScope;
use crate::record::Value;
use crate::schema::ddl::{self, quote_ident};
use crate::schema::{ColumnType, TableSchema};

/// PostgreSQL accepts at most this many bind parameters per statement
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Record store backed by a connection pool
///
/// Each chunk is inserted inside its own transaction, so a failed chunk
/// leaves no partial roots or orphaned children behind. Earlier chunks stay
/// committed.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Rows per INSERT statement for a table with `columns` bound columns
fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

fn insert_prefix(table_rows: &TableRows) -> String {
    let columns = table_rows
        .column_names()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) ", quote_ident(table_rows.table.name), columns)
}

fn push_value(b: &mut Separated<'_, '_, Postgres, &'static str>, value: &Value, ty: ColumnType) {
    match ty {
        ColumnType::Text => b.push_bind(value.as_text().map(str::to_owned)),
        ColumnType::BigInt => b.push_bind(value.as_i64()),
        ColumnType::Boolean => b.push_bind(value.as_bool()),
        ColumnType::Timestamp => b.push_bind(value.as_timestamp()),
        ColumnType::Json => b.push_bind(value.as_json().cloned()),
    };
}

fn push_row(
    mut b: Separated<'_, '_, Postgres, &'static str>,
    table_rows: &TableRows,
    prepared: &PreparedRow,
) {
    b.push_bind(prepared.row_id);
    if !table_rows.is_root() {
        b.push_bind(prepared.parent_row_id);
    }
    for column in table_rows.partition_columns {
        b.push_bind(prepared.row.get(column).as_text().map(str::to_owned));
    }
    for column in table_rows.table.columns {
        push_value(&mut b, prepared.row.get(column.name), column.ty);
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ensure_schema(
        &self,
        table: &TableSchema,
        scope: PartitionScope,
    ) -> Result<(), StoreError> {
        for statement in ddl::create_table_statements(table, scope) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        debug!(table = table.name, "Schema ensured");
        Ok(())
    }

    async fn delete_partition(
        &self,
        table: &TableSchema,
        partition: &[(&'static str, &str)],
    ) -> Result<u64, StoreError> {
        if partition.is_empty() {
            // An empty filter would clear the whole table
            return Err(StoreError::schema(format!(
                "refusing to delete from {} without partition columns",
                table.name
            )));
        }

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("DELETE FROM {} WHERE ", quote_ident(table.name)));

        for (i, (column, value)) in partition.iter().enumerate() {
            if i > 0 {
                query_builder.push(" AND ");
            }
            query_builder.push(quote_ident(column));
            query_builder.push(" = ");
            query_builder.push_bind(value.to_string());
        }

        let result = query_builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_chunk(&self, chunk: &WriteChunk) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for table_rows in &chunk.tables {
            if table_rows.rows.is_empty() {
                continue;
            }

            let per_statement = rows_per_statement(table_rows.column_names().len());
            for part in table_rows.rows.chunks(per_statement) {
                let mut query_builder: QueryBuilder<Postgres> =
                    QueryBuilder::new(insert_prefix(table_rows));
                query_builder.push_values(part, |b, prepared| push_row(b, table_rows, prepared));
                query_builder.build().execute(&mut *tx).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
