//! EC2 networking resources

use serde::{Deserialize, Serialize};

use super::{Filter, TAG_COLUMNS};
use crate::descriptor::{decode_request, ListOperation, PaginatedInput, ResourceDescriptor};
use crate::partition::PartitionScope;
use crate::schema::{Column, Relation, TableSchema};
use crate::transform::map_item;

// ============================================================================
// NAT gateways
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DescribeNatGatewaysInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nat_gateway_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PaginatedInput for DescribeNatGatewaysInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

const NAT_GATEWAY_ADDRESSES: TableSchema = TableSchema::new(
    "aws_ec2_nat_gateway_addresses",
    &[
        Column::text("allocation_id", "AllocationId"),
        Column::text("network_interface_id", "NetworkInterfaceId"),
        Column::text("private_ip", "PrivateIp"),
        Column::text("public_ip", "PublicIp"),
    ],
    &[],
);

const NAT_GATEWAY_TAGS: TableSchema =
    TableSchema::new("aws_ec2_nat_gateway_tags", TAG_COLUMNS, &[]);

pub static NAT_GATEWAYS: ResourceDescriptor = ResourceDescriptor {
    name: "ec2.nat_gateways",
    operation: ListOperation {
        service: "ec2",
        action: "DescribeNatGateways",
        items_field: "NatGateways",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_ec2_nat_gateways",
        &[
            Column::timestamp("create_time", "CreateTime"),
            Column::timestamp("delete_time", "DeleteTime"),
            Column::text("failure_code", "FailureCode"),
            Column::text("failure_message", "FailureMessage"),
            Column::text("nat_gateway_id", "NatGatewayId"),
            Column::timestamp(
                "provisioned_bandwidth_provision_time",
                "ProvisionedBandwidth.ProvisionTime",
            ),
            Column::text(
                "provisioned_bandwidth_provisioned",
                "ProvisionedBandwidth.Provisioned",
            ),
            Column::timestamp(
                "provisioned_bandwidth_request_time",
                "ProvisionedBandwidth.RequestTime",
            ),
            Column::text(
                "provisioned_bandwidth_requested",
                "ProvisionedBandwidth.Requested",
            ),
            Column::text("provisioned_bandwidth_status", "ProvisionedBandwidth.Status"),
            Column::text("state", "State"),
            Column::text("subnet_id", "SubnetId"),
            Column::text("vpc_id", "VpcId"),
        ],
        &[
            Relation::many("NatGatewayAddresses", NAT_GATEWAY_ADDRESSES),
            Relation::many("Tags", NAT_GATEWAY_TAGS),
        ],
    ),
    decode: decode_request::<DescribeNatGatewaysInput>,
    transform: map_item,
};

// ============================================================================
// Internet gateways
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DescribeInternetGatewaysInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internet_gateway_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PaginatedInput for DescribeInternetGatewaysInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

const INTERNET_GATEWAY_ATTACHMENTS: TableSchema = TableSchema::new(
    "aws_ec2_internet_gateway_attachments",
    &[Column::text("state", "State"), Column::text("vpc_id", "VpcId")],
    &[],
);

const INTERNET_GATEWAY_TAGS: TableSchema =
    TableSchema::new("aws_ec2_internet_gateway_tags", TAG_COLUMNS, &[]);

pub static INTERNET_GATEWAYS: ResourceDescriptor = ResourceDescriptor {
    name: "ec2.internet_gateways",
    operation: ListOperation {
        service: "ec2",
        action: "DescribeInternetGateways",
        items_field: "InternetGateways",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_ec2_internet_gateways",
        &[
            Column::text("internet_gateway_id", "InternetGatewayId"),
            Column::text("owner_id", "OwnerId"),
        ],
        &[
            Relation::many("Attachments", INTERNET_GATEWAY_ATTACHMENTS),
            Relation::many("Tags", INTERNET_GATEWAY_TAGS),
        ],
    ),
    decode: decode_request::<DescribeInternetGatewaysInput>,
    transform: map_item,
};

// ============================================================================
// Network ACLs
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DescribeNetworkAclsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_acl_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PaginatedInput for DescribeNetworkAclsInput {
    fn set_cursor(&mut self, cursor: String) {
        self.next_token = Some(cursor);
    }
}

const NETWORK_ACL_ASSOCIATIONS: TableSchema = TableSchema::new(
    "aws_ec2_network_acl_associations",
    &[
        Column::text("network_acl_association_id", "NetworkAclAssociationId"),
        Column::text("network_acl_id", "NetworkAclId"),
        Column::text("subnet_id", "SubnetId"),
    ],
    &[],
);

// IcmpTypeCode and PortRange are embedded value objects
const NETWORK_ACL_ENTRIES: TableSchema = TableSchema::new(
    "aws_ec2_network_acl_entries",
    &[
        Column::text("cidr_block", "CidrBlock"),
        Column::boolean("egress", "Egress"),
        Column::bigint("icmp_type_code_code", "IcmpTypeCode.Code"),
        Column::bigint("icmp_type_code_type", "IcmpTypeCode.Type"),
        Column::text("ipv6_cidr_block", "Ipv6CidrBlock"),
        Column::bigint("port_range_from", "PortRange.From"),
        Column::bigint("port_range_to", "PortRange.To"),
        Column::text("protocol", "Protocol"),
        Column::text("rule_action", "RuleAction"),
        Column::bigint("rule_number", "RuleNumber"),
    ],
    &[],
);

const NETWORK_ACL_TAGS: TableSchema =
    TableSchema::new("aws_ec2_network_acl_tags", TAG_COLUMNS, &[]);

pub static NETWORK_ACLS: ResourceDescriptor = ResourceDescriptor {
    name: "ec2.network_acls",
    operation: ListOperation {
        service: "ec2",
        action: "DescribeNetworkAcls",
        items_field: "NetworkAcls",
        cursor_field: "NextToken",
    },
    scope: PartitionScope::Regional,
    table: TableSchema::new(
        "aws_ec2_network_acls",
        &[
            Column::boolean("is_default", "IsDefault"),
            Column::text("network_acl_id", "NetworkAclId"),
            Column::text("owner_id", "OwnerId"),
            Column::text("vpc_id", "VpcId"),
        ],
        &[
            Relation::many("Associations", NETWORK_ACL_ASSOCIATIONS),
            Relation::many("Entries", NETWORK_ACL_ENTRIES),
            Relation::many("Tags", NETWORK_ACL_TAGS),
        ],
    ),
    decode: decode_request::<DescribeNetworkAclsInput>,
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

    fn transform(descriptor: &ResourceDescriptor, item: serde_json::Value) -> crate::record::RootRecord {
        let partition = PartitionKey::new("123456789012", "us-east-1");
        let ctx = TransformContext::new(&partition, descriptor.scope, &descriptor.table);
        (descriptor.transform)(&item, &ctx)
    }

    #[test]
    fn test_nat_gateway_embeds_bandwidth_and_owns_children() {
        let record = transform(
            &NAT_GATEWAYS,
            json!({
                "NatGatewayId": "nat-0abc",
                "State": "available",
                "CreateTime": "2020-11-02T10:00:00Z",
                "ProvisionedBandwidth": {"Provisioned": "5Gbps", "Status": "ok"},
                "NatGatewayAddresses": [{"PublicIp": "203.0.113.7", "PrivateIp": "10.0.0.4"}],
                "Tags": [{"Key": "Name", "Value": "egress"}, {"Key": "env", "Value": "prod"}]
            }),
        );

        assert_eq!(record.row.get("nat_gateway_id"), &Value::from("nat-0abc"));
        assert_eq!(
            record.row.get("provisioned_bandwidth_provisioned"),
            &Value::from("5Gbps")
        );
        assert!(record.row.get("provisioned_bandwidth_requested").is_null());
        assert!(record.row.get("delete_time").is_null());

        let tables: Vec<_> = record.children.iter().map(|c| c.table).collect();
        assert_eq!(
            tables,
            vec![
                "aws_ec2_nat_gateway_addresses",
                "aws_ec2_nat_gateway_tags",
                "aws_ec2_nat_gateway_tags"
            ]
        );
    }

    #[test]
    fn test_network_acl_entry_port_range_is_inline() {
        let record = transform(
            &NETWORK_ACLS,
            json!({
                "NetworkAclId": "acl-1",
                "IsDefault": true,
                "Entries": [
                    {"RuleNumber": 100, "Egress": false, "PortRange": {"From": 443, "To": 443}},
                    {"RuleNumber": 32767, "Egress": true, "IcmpTypeCode": {"Code": -1, "Type": 8}}
                ]
            }),
        );

        let entries: Vec<_> = record
            .children
            .iter()
            .filter(|c| c.table == "aws_ec2_network_acl_entries")
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].row.get("port_range_from"), &Value::BigInt(443));
        assert!(entries[0].row.get("icmp_type_code_type").is_null());
        assert_eq!(entries[1].row.get("icmp_type_code_code"), &Value::BigInt(-1));
        assert_eq!(entries[1].row.get("egress"), &Value::Boolean(true));
    }

    #[test]
    fn test_nat_gateway_request_decodes_filters() {
        let request = (NAT_GATEWAYS.decode)(json!({
            "MaxResults": 50,
            "Filter": [{"Name": "state", "Values": ["available"]}]
        }))
        .unwrap();
        assert_eq!(
            request.to_params().unwrap(),
            json!({"MaxResults": 50, "Filter": [{"Name": "state", "Values": ["available"]}]})
        );
    }

    #[test]
    fn test_internet_gateway_attachments() {
        let record = transform(
            &INTERNET_GATEWAYS,
            json!({
                "InternetGatewayId": "igw-1",
                "Attachments": [{"State": "available", "VpcId": "vpc-1"}]
            }),
        );
        assert_eq!(record.children.len(), 1);
        assert_eq!(record.children[0].row.get("vpc_id"), &Value::from("vpc-1"));
    }
}
