//! EMR clusters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::{decode_request, ListOperation, PaginatedInput, ResourceDescriptor};
use crate::partition::PartitionScope;
use crate::schema::{Column, Relation, TableSchema};
use crate::transform::map_item;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ListClustersInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_states: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl PaginatedInput for ListClustersInput {
    fn set_cursor(&mut self, cursor: String) {
        self.marker = Some(cursor);
    }
}

/// One-to-one status row; reason and timeline are embedded
const CLUSTER_STATUSES: TableSchema = TableSchema::new(
    "aws_emr_cluster_statuses",
    &[
        Column::text("state", "State"),
        Column::text("state_change_reason_code", "StateChangeReason.Code"),
        Column::text("state_change_reason_message", "StateChangeReason.Message"),
        Column::timestamp("timeline_creation_date_time", "Timeline.CreationDateTime"),
        Column::timestamp("timeline_end_date_time", "Timeline.EndDateTime"),
        Column::timestamp("timeline_ready_date_time", "Timeline.ReadyDateTime"),
    ],
    &[],
);

pub static CLUSTERS: ResourceDescriptor = ResourceDescriptor {
    name: "emr.clusters",
    operation: ListOperation {
        service: "emr",
        action: "ListClusters",
        items_field: "Clusters",
        cursor_field: "Marker",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_emr_clusters",
        &[
            Column::text("cluster_arn", "ClusterArn"),
            Column::text("id", "Id"),
            Column::text("name", "Name"),
            Column::bigint("normalized_instance_hours", "NormalizedInstanceHours"),
            Column::text("outpost_arn", "OutpostArn"),
        ],
        &[Relation::one("Status", CLUSTER_STATUSES)],
    ),
    decode: decode_request::<ListClustersInput>,
    transform: map_item,
};
