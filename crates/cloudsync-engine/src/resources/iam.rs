//! IAM groups
//!
//! IAM is account-wide: groups are partitioned by account only, and the
//! region a sync runs in merely selects the endpoint.

use serde::{Deserialize, Serialize};

use crate::descriptor::{decode_request, ListOperation, PaginatedInput, ResourceDescriptor};
use crate::partition::PartitionScope;
use crate::schema::{Column, TableSchema};
use crate::transform::map_item;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ListGroupsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

impl PaginatedInput for ListGroupsInput {
    fn set_cursor(&mut self, cursor: String) {
        self.marker = Some(cursor);
    }
}

pub static GROUPS: ResourceDescriptor = ResourceDescriptor {
    name: "iam.groups",
    operation: ListOperation {
        service: "iam",
        action: "ListGroups",
        items_field: "Groups",
        cursor_field: "Marker",
    },
    scope: PartitionScope::Global,
    table: TableSchema::new(
        "aws_iam_groups",
        &[
            Column::text("arn", "Arn"),
            Column::timestamp("create_date", "CreateDate"),
            Column::text("group_id", "GroupId"),
            Column::text("group_name", "GroupName"),
            Column::text("path", "Path"),
        ],
        &[],
    ),
    decode: decode_request::<ListGroupsInput>,
    transform: map_item,
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::partition::PartitionKey;
    use crate::transform::TransformContext;
    use serde_json::json;

    #[test]
    fn test_group_rows_carry_account_only() {
        let partition = PartitionKey::new("123456789012", "us-east-1");
        let ctx = TransformContext::new(&partition, GROUPS.scope, &GROUPS.table);
        let record = (GROUPS.transform)(
            &json!({"GroupName": "admins", "Path": "/", "CreateDate": "2019-05-01T12:00:00Z"}),
            &ctx,
        );
        assert_eq!(record.row.get("account_id").as_text(), Some("123456789012"));
        assert!(record.row.get("region").is_null());
        assert!(!record.row.get("create_date").is_null());
    }

    #[test]
    fn test_max_items_must_be_numeric() {
        assert!((GROUPS.decode)(json!({"MaxItems": 100, "PathPrefix": "/ops/"})).is_ok());
        assert!((GROUPS.decode)(json!({"MaxItems": "lots"})).is_err());
    }
}
