//! Task dispatch
//!
//! `fetch` syncs every configured resource for every configured partition.
//! Syncs run with bounded concurrency and fail independently: one failed
//! (resource, partition) is logged and counted, the rest carry on. Any other
//! task name is logged and ignored.

use cloudsync_engine::db::{create_pool, health_check, DbConfig};
use cloudsync_engine::{
    HttpListProvider, MemoryStore, PartitionKey, PartitionScope, PgRecordStore, RecordStore,
    Registry, RelationalWriter, SyncContext, SyncError,
};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{AppConfig, FetchConfig};
use crate::error::Result;

pub const FETCH_TASK: &str = "fetch";

#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Write into an in-memory store instead of PostgreSQL
    pub dry_run: bool,
    pub cancel: CancellationToken,
}

/// One (resource, partition) sync that did not complete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFailure {
    pub resource: String,
    pub partition: PartitionKey,
    pub kind: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task: String,
    pub succeeded: usize,
    pub failures: Vec<SyncFailure>,
}

impl TaskSummary {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            succeeded: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn message(&self) -> String {
        format!("Completed task {}", self.task)
    }
}

/// A planned sync
#[derive(Debug, Clone, PartialEq)]
pub struct SyncJob {
    pub resource: String,
    pub partition: PartitionKey,
    pub config: serde_json::Value,
}

/// Run a named task
pub async fn execute_task(task: &str, config: &AppConfig, options: &TaskOptions) -> Result<TaskSummary> {
    match task {
        FETCH_TASK => fetch(config, options).await,
        _ => {
            warn!(task, "Unknown task");
            Ok(TaskSummary::new(task))
        }
    }
}

async fn fetch(config: &AppConfig, options: &TaskOptions) -> Result<TaskSummary> {
    let fetch_config = FetchConfig::load(&config.config_path)?;
    let registry = Registry::builtin();

    let store: Arc<dyn RecordStore> = if options.dry_run {
        info!("Dry run: records are kept in memory and discarded");
        Arc::new(MemoryStore::new())
    } else {
        let db_config = DbConfig::from_env()?;
        let pool = create_pool(&db_config).await?;
        health_check(&pool).await?;
        Arc::new(PgRecordStore::new(pool))
    };
    let writer = RelationalWriter::new(store, config.max_chunk_size);

    let provider = HttpListProvider::new(&config.provider_config())?;
    let ctx = SyncContext::new(Arc::new(provider), writer).with_cancellation(options.cancel.clone());

    Ok(run_fetch(&registry, &ctx, &fetch_config, config.max_concurrency).await)
}

/// Expand the fetch configuration into individual syncs
///
/// Names the registry does not know are planned as regional; their syncs
/// fail with an unknown resource type error.
pub fn plan_fetch(registry: &Registry, fetch: &FetchConfig) -> Vec<SyncJob> {
    fetch
        .resources
        .iter()
        .flat_map(|resource| {
            let scope = registry
                .get(&resource.name)
                .map(|d| d.scope)
                .unwrap_or(PartitionScope::Regional);
            fetch.partitions(scope).into_iter().map(move |partition| SyncJob {
                resource: resource.name.clone(),
                partition,
                config: resource.config.clone(),
            })
        })
        .collect()
}

/// Create the tables of every configured resource the registry knows
///
/// Returns the resources whose schema could not be set up, keyed by name.
pub async fn ensure_schemas(
    registry: &Registry,
    writer: &RelationalWriter,
    fetch: &FetchConfig,
) -> HashMap<String, SyncError> {
    let mut failed = HashMap::new();
    for resource in &fetch.resources {
        let Some(descriptor) = registry.get(&resource.name) else {
            continue;
        };
        if let Err(e) = writer.ensure_schema(descriptor).await {
            error!(resource = %resource.name, error = %e, "Schema setup failed");
            failed.insert(resource.name.clone(), SyncError::Storage(e));
        }
    }
    failed
}

/// Run every planned sync, at most `max_concurrency` at a time
///
/// A resource whose schema cannot be set up fails all of its syncs without
/// calling the provider; the other resources still run.
pub async fn run_fetch(
    registry: &Registry,
    ctx: &SyncContext,
    fetch: &FetchConfig,
    max_concurrency: usize,
) -> TaskSummary {
    let schema_failures = ensure_schemas(registry, &ctx.writer, fetch).await;
    let (jobs, blocked): (Vec<_>, Vec<_>) = plan_fetch(registry, fetch)
        .into_iter()
        .partition(|job| !schema_failures.contains_key(&job.resource));
    info!(syncs = jobs.len(), skipped = blocked.len(), max_concurrency, "Starting fetch");

    let outcomes: Vec<_> = stream::iter(jobs)
        .map(|job| async move {
            let result = registry
                .run(ctx, &job.resource, &job.partition, job.config.clone())
                .await;
            (job, result)
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let mut summary = TaskSummary::new(FETCH_TASK);
    for job in blocked {
        if let Some(e) = schema_failures.get(&job.resource) {
            summary.failures.push(SyncFailure {
                resource: job.resource,
                partition: job.partition,
                kind: e.kind(),
                error: e.to_string(),
            });
        }
    }
    for (job, result) in outcomes {
        match result {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                error!(
                    resource = %job.resource,
                    partition = %job.partition,
                    kind = e.kind(),
                    error = %e,
                    "Resource sync failed"
                );
                summary.failures.push(SyncFailure {
                    resource: job.resource,
                    partition: job.partition,
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }
    }
    summary
        .failures
        .sort_by(|a, b| (&a.resource, &a.partition).cmp(&(&b.resource, &b.partition)));

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed(),
        "Fetch finished"
    );
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn fetch_config() -> FetchConfig {
        FetchConfig::from_yaml(
            r#"
accounts:
  - id: "1"
    regions: [us-east-1, eu-west-1]
  - id: "2"
    regions: [us-west-2]
resources:
  - name: ec2.internet_gateways
  - name: iam.groups
    config: {PathPrefix: /ops/}
  - name: s3.buckets
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_follows_resource_scope() {
        let jobs = plan_fetch(&Registry::builtin(), &fetch_config());

        let count = |name: &str| jobs.iter().filter(|j| j.resource == name).count();
        assert_eq!(count("ec2.internet_gateways"), 3);
        assert_eq!(count("iam.groups"), 2);
        assert_eq!(count("s3.buckets"), 3);
        assert_eq!(jobs.len(), 8);
    }

    #[test]
    fn test_plan_pairs_are_unique() {
        let jobs = plan_fetch(&Registry::builtin(), &fetch_config());
        let pairs: std::collections::HashSet<_> =
            jobs.iter().map(|j| (&j.resource, &j.partition)).collect();
        assert_eq!(pairs.len(), jobs.len());
    }

    #[test]
    fn test_plan_passes_config_through() {
        let jobs = plan_fetch(&Registry::builtin(), &fetch_config());
        let groups = jobs.iter().find(|j| j.resource == "iam.groups").unwrap();
        assert_eq!(groups.config, serde_json::json!({"PathPrefix": "/ops/"}));
    }

    #[test]
    fn test_repeated_region_is_rejected_before_planning() {
        let result = FetchConfig::from_yaml(
            "accounts: [{id: '1', regions: [us-east-1, us-east-1]}]\nresources: [{name: ec2.internet_gateways}]",
        );
        assert!(matches!(result, Err(crate::error::CliError::Config(_))));
    }

    #[tokio::test]
    async fn test_schema_failure_only_fails_its_resource() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/list"))
            .and(body_partial_json(json!({"action": "DescribeInternetGateways"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "InternetGateways": [{"InternetGatewayId": "igw-1"}]
            })))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/list"))
            .and(body_partial_json(json!({"action": "ListGroups"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Groups": []})))
            .expect(0)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        store.fail_schema("aws_iam_groups").await;
        let app = AppConfig {
            provider_endpoint: format!("{}/list", server.uri()),
            ..AppConfig::default()
        };
        let provider = HttpListProvider::new(&app.provider_config()).unwrap();
        let writer = RelationalWriter::new(Arc::new(store.clone()), 10);
        let ctx = SyncContext::new(Arc::new(provider), writer);

        let summary = run_fetch(&Registry::builtin(), &ctx, &fetch_config(), 2).await;

        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed(), 5);
        let kinds = |resource: &str| -> Vec<&'static str> {
            summary
                .failures
                .iter()
                .filter(|f| f.resource == resource)
                .map(|f| f.kind)
                .collect()
        };
        assert_eq!(kinds("iam.groups"), vec!["storage", "storage"]);
        assert_eq!(kinds("s3.buckets").len(), 3);
        assert_eq!(store.row_count("aws_ec2_internet_gateways").await, 3);
    }

    #[tokio::test]
    async fn test_unknown_task_is_a_noop() {
        let config = AppConfig {
            config_path: "/nonexistent/config.yml".into(),
            ..AppConfig::default()
        };
        let summary = execute_task("policy", &config, &TaskOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.message(), "Completed task policy");
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed(), 0);
    }
}
