//! Elastic Beanstalk environments
//!
//! The deepest built-in hierarchy: environment -> resources -> load
//! balancer -> listeners, every level cascading from the one above.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::{decode_request, ListOperation, PaginatedInput, ResourceDescriptor};
use crate::partition::PartitionScope;
use crate::schema::{Column, Relation, TableSchema};
use crate::transform::map_item;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DescribeEnvironmentsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_deleted_back_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_records: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,
}

impl PaginatedInput for DescribeEnvironmentsInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

const ENVIRONMENT_LINKS: TableSchema = TableSchema::new(
    "aws_elasticbeanstalk_environment_links",
    &[
        Column::text("environment_name", "EnvironmentName"),
        Column::text("link_name", "LinkName"),
    ],
    &[],
);

const ENVIRONMENT_LISTENERS: TableSchema = TableSchema::new(
    "aws_elasticbeanstalk_environment_listeners",
    &[
        Column::bigint("port", "Port"),
        Column::text("protocol", "Protocol"),
    ],
    &[],
);

const ENVIRONMENT_LOAD_BALANCERS: TableSchema = TableSchema::new(
    "aws_elasticbeanstalk_environment_load_balancers",
    &[
        Column::text("domain", "Domain"),
        Column::text("load_balancer_name", "LoadBalancerName"),
    ],
    &[Relation::many("Listeners", ENVIRONMENT_LISTENERS)],
);

// Holds no columns of its own, only the link to the load balancer
const ENVIRONMENT_RESOURCES: TableSchema = TableSchema::new(
    "aws_elasticbeanstalk_environment_resources",
    &[],
    &[Relation::one("LoadBalancer", ENVIRONMENT_LOAD_BALANCERS)],
);

pub static ENVIRONMENTS: ResourceDescriptor = ResourceDescriptor {
    name: "elasticbeanstalk.environments",
    operation: ListOperation {
        service: "elasticbeanstalk",
        action: "DescribeEnvironments",
        items_field: "Environments",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_elasticbeanstalk_environments",
        &[
            Column::boolean(
                "abortable_operation_in_progress",
                "AbortableOperationInProgress",
            ),
            Column::text("application_name", "ApplicationName"),
            Column::text("cname", "CNAME"),
            Column::timestamp("date_created", "DateCreated"),
            Column::timestamp("date_updated", "DateUpdated"),
            Column::text("description", "Description"),
            Column::text("endpoint_url", "EndpointURL"),
            Column::text("environment_arn", "EnvironmentArn"),
            Column::text("environment_id", "EnvironmentId"),
            Column::text("environment_name", "EnvironmentName"),
            Column::text("health", "Health"),
            Column::text("health_status", "HealthStatus"),
            Column::text("operations_role", "OperationsRole"),
            Column::text("platform_arn", "PlatformArn"),
            Column::text("solution_stack_name", "SolutionStackName"),
            Column::text("status", "Status"),
            Column::text("template_name", "TemplateName"),
            Column::text("tier_name", "Tier.Name"),
            Column::text("tier_type", "Tier.Type"),
            Column::text("tier_version", "Tier.Version"),
            Column::text("version_label", "VersionLabel"),
        ],
        &[
            Relation::many("EnvironmentLinks", ENVIRONMENT_LINKS),
            Relation::one("Resources", ENVIRONMENT_RESOURCES),
        ],
    ),
    decode: decode_request::<DescribeEnvironmentsInput>,
    transform: map_item,
};
