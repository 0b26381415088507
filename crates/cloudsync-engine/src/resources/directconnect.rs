//! Direct Connect gateways

use serde::{Deserialize, Serialize};

use crate::descriptor::{decode_request, ListOperation, PaginatedInput, ResourceDescriptor};
use crate::partition::PartitionScope;
use crate::schema::{Column, TableSchema};
use crate::transform::map_item;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DescribeDirectConnectGatewaysInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_connect_gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PaginatedInput for DescribeDirectConnectGatewaysInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

pub static GATEWAYS: ResourceDescriptor = ResourceDescriptor {
    name: "directconnect.gateways",
    operation: ListOperation {
        service: "directconnect",
        action: "DescribeDirectConnectGateways",
        items_field: "DirectConnectGateways",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_directconnect_gateways",
        &[
            Column::bigint("amazon_side_asn", "AmazonSideAsn"),
            Column::text("direct_connect_gateway_id", "DirectConnectGatewayId"),
            Column::text("direct_connect_gateway_name", "DirectConnectGatewayName"),
            Column::text("direct_connect_gateway_state", "DirectConnectGatewayState"),
            Column::text("owner_account", "OwnerAccount"),
            Column::text("state_change_error", "StateChangeError"),
        ],
        &[],
    ),
    decode: decode_request::<DescribeDirectConnectGatewaysInput>,
    transform: map_item,
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::partition::PartitionKey;
    use crate::record::Value;
    use crate::transform::TransformContext;
    use serde_json::json;

    #[test]
    fn test_gateway_asn_zero_is_kept() {
        let partition = PartitionKey::new("1", "us-east-1");
        let ctx = TransformContext::new(&partition, GATEWAYS.scope, &GATEWAYS.table);
        let record = (GATEWAYS.transform)(
            &json!({"DirectConnectGatewayId": "dx-1", "AmazonSideAsn": 0}),
            &ctx,
        );
        assert_eq!(record.row.get("amazon_side_asn"), &Value::BigInt(0));
        assert!(record.row.get("state_change_error").is_null());
    }
}
