//! Relational records produced by transforms and consumed by the writer

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::schema::ColumnType;

/// A single column value
///
/// `Null` is the explicit "no value" marker: an absent provider field is
/// never turned into `0`, `false`, or `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    BigInt(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may be stored in a column of `ty`
    ///
    /// `Null` fits every column.
    pub fn fits(&self, ty: ColumnType) -> bool {
        matches!(
            (self, ty),
            (Value::Null, _)
                | (Value::Text(_), ColumnType::Text)
                | (Value::BigInt(_), ColumnType::BigInt)
                | (Value::Boolean(_), ColumnType::Boolean)
                | (Value::Timestamp(_), ColumnType::Timestamp)
                | (Value::Json(_), ColumnType::Json)
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    values: BTreeMap<&'static str, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        self.values.insert(column, value.into());
    }

    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Value for a column; unset columns read as `Null`
    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&Value::Null)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One provider resource instance, with everything it owns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RootRecord {
    pub row: Row,
    pub children: Vec<ChildRecord>,
}

impl RootRecord {
    pub fn new(row: Row) -> Self {
        Self {
            row,
            children: Vec::new(),
        }
    }

    /// Total descendant rows, at any depth
    pub fn descendant_count(&self) -> usize {
        self.children.iter().map(ChildRecord::subtree_size).sum()
    }
}

/// Row exclusively owned by a parent record
///
/// Lives and dies with its parent: it is only ever inserted together with
/// the parent and is removed by cascade when the parent is cleared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildRecord {
    pub table: &'static str,
    pub row: Row,
    pub children: Vec<ChildRecord>,
}

impl ChildRecord {
    pub fn new(table: &'static str, row: Row) -> Self {
        Self {
            table,
            row,
            children: Vec::new(),
        }
    }

    /// This row plus all of its descendants
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ChildRecord::subtree_size)
            .sum::<usize>()
    }
}
