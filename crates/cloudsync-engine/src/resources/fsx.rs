//! FSx backups

use serde::{Deserialize, Serialize};

use super::{Filter, TAG_COLUMNS};
use crate::descriptor::{decode_request, ListOperation, PaginatedInput, ResourceDescriptor};
use crate::partition::PartitionScope;
use crate::schema::{Column, Relation, TableSchema};
use crate::transform::map_item;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DescribeBackupsInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backup_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PaginatedInput for DescribeBackupsInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

const BACKUP_TAGS: TableSchema = TableSchema::new("aws_fsx_backup_tags", TAG_COLUMNS, &[]);

pub static BACKUPS: ResourceDescriptor = ResourceDescriptor {
    name: "fsx.backups",
    operation: ListOperation {
        service: "fsx",
        action: "DescribeBackups",
        items_field: "Backups",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_fsx_backups",
        &[
            Column::text("backup_id", "BackupId"),
            Column::timestamp("creation_time", "CreationTime"),
            Column::text(
                "directory_information_active_directory_id",
                "DirectoryInformation.ActiveDirectoryId",
            ),
            Column::text(
                "directory_information_domain_name",
                "DirectoryInformation.DomainName",
            ),
            Column::text("failure_details_message", "FailureDetails.Message"),
            Column::text("kms_key_id", "KmsKeyId"),
            Column::text("lifecycle", "Lifecycle"),
            Column::bigint("progress_percent", "ProgressPercent"),
            Column::text("resource_arn", "ResourceARN"),
            Column::text("type", "Type"),
        ],
        &[Relation::many("Tags", BACKUP_TAGS)],
    ),
    decode: decode_request::<DescribeBackupsInput>,
    transform: map_item,
};
