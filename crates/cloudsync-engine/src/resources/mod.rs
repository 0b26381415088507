//! Built-in resource descriptors
//!
//! Pure domain data: request shapes, list calls and table layouts. Table
//! and column names follow the `aws_<service>_<resource>` convention.

pub mod directconnect;
pub mod ec2;
pub mod elasticbeanstalk;
pub mod emr;
pub mod fsx;
pub mod iam;

use serde::{Deserialize, Serialize};

use crate::descriptor::ResourceDescriptor;
use crate::schema::Column;

static BUILTIN: [&ResourceDescriptor; 8] = [
    &ec2::NAT_GATEWAYS,
    &ec2::INTERNET_GATEWAYS,
    &ec2::NETWORK_ACLS,
    &directconnect::GATEWAYS,
    &emr::CLUSTERS,
    &fsx::BACKUPS,
    &elasticbeanstalk::ENVIRONMENTS,
    &iam::GROUPS,
];

/// Every built-in descriptor
pub fn builtin() -> &'static [&'static ResourceDescriptor] {
    &BUILTIN
}

/// Name/values filter accepted by several describe calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Columns of every `*_tags` child table
pub(crate) const TAG_COLUMNS: &[Column] =
    &[Column::text("key", "Key"), Column::text("value", "Value")];
