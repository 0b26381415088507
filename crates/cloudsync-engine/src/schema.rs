//! Explicit table schemas for persisted resources
//!
//! A resource's storage layout is declared as data: the root table, its
//! columns with the provider field each one is read from, and the owned child
//! tables hanging off it. The transformer, the writer, and the DDL renderer
//! all consume the same declaration, so nothing is inferred at runtime.
//!
//! Embedded value objects (a bandwidth descriptor, a port range) have no
//! table of their own. They are declared as ordinary columns with a prefixed
//! name and a dotted source path:
//!
//! ```rust,ignore
//! Column::text("provisioned_bandwidth_status", "ProvisionedBandwidth.Status")
//! ```

/// Surrogate key column present on every table
pub const ROW_ID_COLUMN: &str = "row_id";

/// Foreign key column on every child table, referencing the parent's `row_id`
pub const PARENT_ROW_ID_COLUMN: &str = "parent_row_id";

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    BigInt,
    Boolean,
    Timestamp,
    Json,
}

impl ColumnType {
    /// PostgreSQL type used in generated DDL
    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMPTZ",
            ColumnType::Json => "JSONB",
        }
    }
}

/// One stored column and the provider field it is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    /// Dotted path into the raw provider item, e.g. `PortRange.From`
    pub source: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType, source: &'static str) -> Self {
        Self { name, ty, source }
    }

    pub const fn text(name: &'static str, source: &'static str) -> Self {
        Self::new(name, ColumnType::Text, source)
    }

    pub const fn bigint(name: &'static str, source: &'static str) -> Self {
        Self::new(name, ColumnType::BigInt, source)
    }

    pub const fn boolean(name: &'static str, source: &'static str) -> Self {
        Self::new(name, ColumnType::Boolean, source)
    }

    pub const fn timestamp(name: &'static str, source: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp, source)
    }

    pub const fn json(name: &'static str, source: &'static str) -> Self {
        Self::new(name, ColumnType::Json, source)
    }
}

/// How many child rows one parent item can own through a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Source is a nested object; at most one child row
    One,
    /// Source is an array; one child row per element
    Many,
}

/// Owned child table hanging off a parent table
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    /// Dotted path of the nested object or array in the parent item
    pub source: &'static str,
    pub cardinality: Cardinality,
    pub table: TableSchema,
}

impl Relation {
    pub const fn many(source: &'static str, table: TableSchema) -> Self {
        Self {
            source,
            cardinality: Cardinality::Many,
            table,
        }
    }

    pub const fn one(source: &'static str, table: TableSchema) -> Self {
        Self {
            source,
            cardinality: Cardinality::One,
            table,
        }
    }
}

/// A table and, recursively, the child tables it owns
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub children: &'static [Relation],
}

impl TableSchema {
    pub const fn new(
        name: &'static str,
        columns: &'static [Column],
        children: &'static [Relation],
    ) -> Self {
        Self {
            name,
            columns,
            children,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Direct child table by name
    pub fn child(&self, name: &str) -> Option<&TableSchema> {
        self.children
            .iter()
            .map(|r| &r.table)
            .find(|t| t.name == name)
    }

    /// This table followed by every descendant, parents before children
    pub fn walk(&self) -> Vec<&TableSchema> {
        let mut out = vec![self];
        for relation in self.children {
            out.extend(relation.table.walk());
        }
        out
    }
}

/// DDL rendering for PostgreSQL
pub mod ddl {
    use super::{TableSchema, PARENT_ROW_ID_COLUMN, ROW_ID_COLUMN};
    use crate::partition::PartitionScope;

    pub(crate) fn quote_ident(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Idempotent statements creating a resource's root table and every
    /// descendant, parents first so foreign keys resolve
    pub fn create_table_statements(root: &TableSchema, scope: PartitionScope) -> Vec<String> {
        let mut statements = Vec::new();

        let mut columns = vec![format!("{} UUID PRIMARY KEY", quote_ident(ROW_ID_COLUMN))];
        columns.extend(
            scope
                .column_names()
                .iter()
                .map(|c| format!("{} TEXT NOT NULL", quote_ident(c))),
        );
        columns.extend(
            root.columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(c.name), c.ty.pg_type())),
        );
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(root.name),
            columns.join(", ")
        ));

        let partition_cols = scope
            .column_names()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&format!("{}_partition_idx", root.name)),
            quote_ident(root.name),
            partition_cols
        ));

        for relation in root.children {
            child_statements(&relation.table, root.name, &mut statements);
        }

        statements
    }

    fn child_statements(table: &TableSchema, parent: &str, statements: &mut Vec<String>) {
        let mut columns = vec![
            format!("{} UUID PRIMARY KEY", quote_ident(ROW_ID_COLUMN)),
            format!(
                "{} UUID NOT NULL REFERENCES {} ({}) ON DELETE CASCADE",
                quote_ident(PARENT_ROW_ID_COLUMN),
                quote_ident(parent),
                quote_ident(ROW_ID_COLUMN)
            ),
        ];
        columns.extend(
            table
                .columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(c.name), c.ty.pg_type())),
        );
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table.name),
            columns.join(", ")
        ));
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&format!("{}_parent_idx", table.name)),
            quote_ident(table.name),
            quote_ident(PARENT_ROW_ID_COLUMN)
        ));

        for relation in table.children {
            child_statements(&relation.table, table.name, statements);
        }
    }
}
