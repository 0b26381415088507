//! Single-resource sync run
//!
//! ```text
//! Idle -> ConfigDecoded -> PartitionCleared -> Paging -> Completed
//!   \__________\_________________\_______________\____> Failed
//! ```
//!
//! The partition is cleared exactly once, before the first page is
//! requested. Every page is transformed and written as soon as it arrives.
//! Nothing already committed is rolled back on failure; rerunning the sync
//! clears the partition and rewrites it.

use futures::StreamExt;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::descriptor::ResourceDescriptor;
use crate::error::{Result, SyncError};
use crate::pagination::fetch_all;
use crate::partition::PartitionKey;
use crate::provider::ListProvider;
use crate::record::RootRecord;
use crate::transform::TransformContext;
use crate::writer::{RelationalWriter, WriteStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    ConfigDecoded,
    PartitionCleared,
    Paging,
    Completed,
    Failed,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub resource: String,
    pub partition: PartitionKey,
    pub pages: usize,
    /// Raw provider items seen across all pages
    pub items: usize,
    pub root_rows: usize,
    pub child_rows: usize,
    pub chunks: usize,
    /// Root rows removed by the initial clear
    pub cleared: u64,
    pub elapsed: Duration,
}

pub struct SyncPipeline<'a> {
    descriptor: &'a ResourceDescriptor,
    provider: &'a dyn ListProvider,
    writer: &'a RelationalWriter,
    cancel: Option<CancellationToken>,
    state: SyncState,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(
        descriptor: &'a ResourceDescriptor,
        provider: &'a dyn ListProvider,
        writer: &'a RelationalWriter,
    ) -> Self {
        Self {
            descriptor,
            provider,
            writer,
            cancel: None,
            state: SyncState::Idle,
        }
    }

    /// Stop between pages once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Run one full sync of this resource for `partition`
    pub async fn run(
        &mut self,
        partition: &PartitionKey,
        raw_config: serde_json::Value,
    ) -> Result<SyncReport> {
        let result = self.execute(partition, raw_config).await;

        match &result {
            Ok(report) => {
                self.state = SyncState::Completed;
                info!(
                    resource = %report.resource,
                    partition = %report.partition,
                    pages = report.pages,
                    items = report.items,
                    root_rows = report.root_rows,
                    child_rows = report.child_rows,
                    chunks = report.chunks,
                    cleared = report.cleared,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Sync completed"
                );
            }
            Err(e) => {
                warn!(
                    resource = self.descriptor.name,
                    partition = %partition,
                    reached = ?self.state,
                    kind = e.kind(),
                    error = %e,
                    "Sync failed"
                );
                self.state = SyncState::Failed;
            }
        }

        result
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    async fn execute(
        &mut self,
        partition: &PartitionKey,
        raw_config: serde_json::Value,
    ) -> Result<SyncReport> {
        let started = Instant::now();
        let descriptor = self.descriptor;
        let provider = self.provider;
        let writer = self.writer;

        let request = (descriptor.decode)(raw_config)
            .map_err(|e| SyncError::config_decode(descriptor.name, e))?;
        self.state = SyncState::ConfigDecoded;

        if self.cancelled() {
            return Err(SyncError::Cancelled {
                resource: descriptor.name.to_string(),
                pages: 0,
            });
        }

        let cleared = writer.clear_partition(descriptor, partition).await?;
        self.state = SyncState::PartitionCleared;

        let ctx = TransformContext::new(partition, descriptor.scope, &descriptor.table);
        let mut pages = std::pin::pin!(fetch_all(
            provider,
            &descriptor.operation,
            partition,
            request
        ));
        self.state = SyncState::Paging;

        let mut page_count = 0;
        let mut items = 0;
        let mut totals = WriteStats::default();

        loop {
            if self.cancelled() {
                return Err(SyncError::Cancelled {
                    resource: descriptor.name.to_string(),
                    pages: page_count,
                });
            }

            let Some(page) = pages.next().await else {
                break;
            };
            let page = page?;

            let records: Vec<RootRecord> = page
                .items
                .iter()
                .map(|item| (descriptor.transform)(item, &ctx))
                .collect();
            let stats = writer.write_batch(descriptor, partition, &records).await?;

            debug!(
                resource = descriptor.name,
                page = page.number,
                items = page.items.len(),
                root_rows = stats.root_rows,
                child_rows = stats.child_rows,
                "Page written"
            );

            page_count += 1;
            items += page.items.len();
            totals.absorb(stats);
        }

        Ok(SyncReport {
            resource: descriptor.name.to_string(),
            partition: partition.clone(),
            pages: page_count,
            items,
            root_rows: totals.root_rows,
            child_rows: totals.child_rows,
            chunks: totals.chunks,
            cleared,
            elapsed: started.elapsed(),
        })
    }
}
