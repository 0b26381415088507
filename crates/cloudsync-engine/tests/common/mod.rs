//! Shared fixtures for engine integration tests
//!
//! - [`ScriptedProvider`]: replays a fixed script of pages and failures and
//!   records every request it receives
//! - [`page`] / [`items`]: terse builders for provider responses
//! - [`WIDGETS`]: a small regional resource with a tags child table

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use cloudsync_engine::{
    decode_request, ListOperation, ListOutput, ListProvider, PaginatedInput, PartitionKey,
    PartitionScope, ProviderError, ResourceDescriptor,
};
use cloudsync_engine::schema::{Column, Relation, TableSchema};
use cloudsync_engine::transform::map_item;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Scripted provider
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub action: String,
    pub partition: PartitionKey,
    pub params: Value,
}

/// Provider that answers from a script, one entry per call
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ListOutput, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ListOutput, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Pages of `sizes[i]` items, chained with cursors `c1`, `c2`, ... and an
    /// empty cursor on the last page
    pub fn paged(sizes: &[usize]) -> Self {
        let last = sizes.len().saturating_sub(1);
        let script = sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let cursor = if i == last { String::new() } else { format!("c{}", i + 1) };
                Ok(page(items(i, n), &cursor))
            })
            .collect();
        Self::new(script)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ListProvider for ScriptedProvider {
    async fn list(
        &self,
        operation: &ListOperation,
        partition: &PartitionKey,
        params: &Value,
    ) -> Result<ListOutput, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            action: operation.action.to_string(),
            partition: partition.clone(),
            params: params.clone(),
        });

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(ProviderError::Failed(message)),
            None => Err(ProviderError::Failed("script exhausted".to_string())),
        }
    }
}

pub fn page(items: Vec<Value>, cursor: &str) -> ListOutput {
    ListOutput {
        items,
        next_cursor: Some(cursor.to_string()),
    }
}

/// `n` widget items for page `page_idx`, each with one tag
pub fn items(page_idx: usize, n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "WidgetId": format!("w-{page_idx}-{i}"),
                "Size": i,
                "Tags": [{"Key": "page", "Value": page_idx.to_string()}]
            })
        })
        .collect()
}

// ============================================================================
// Test resource
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ListWidgetsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PaginatedInput for ListWidgetsInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

pub const WIDGET_TAGS: TableSchema = TableSchema::new(
    "test_widget_tags",
    &[Column::text("key", "Key"), Column::text("value", "Value")],
    &[],
);

pub static WIDGETS: ResourceDescriptor = ResourceDescriptor {
    name: "test.widgets",
    operation: ListOperation {
        service: "test",
        action: "ListWidgets",
        items_field: "Widgets",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "test_widgets",
        &[
            Column::text("widget_id", "WidgetId"),
            Column::bigint("size", "Size"),
        ],
        &[Relation::many("Tags", WIDGET_TAGS)],
    ),
    decode: decode_request::<ListWidgetsInput>,
    transform: map_item,
};

pub fn partition() -> PartitionKey {
    PartitionKey::new("111122223333", "us-east-1")
}
