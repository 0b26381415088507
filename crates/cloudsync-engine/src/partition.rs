//! Partition keys scoping every sync run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column holding the owning account on every root table
pub const ACCOUNT_COLUMN: &str = "account_id";

/// Column holding the region on root tables of regional resources
pub const REGION_COLUMN: &str = "region";

/// (account, region) pair bounding a sync's clear-and-replace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub account_id: String,
    pub region: String,
}

impl PartitionKey {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// Partition column values for a resource of the given scope, in column order
    pub fn columns(&self, scope: PartitionScope) -> Vec<(&'static str, &str)> {
        match scope {
            PartitionScope::Regional => vec![
                (ACCOUNT_COLUMN, self.account_id.as_str()),
                (REGION_COLUMN, self.region.as_str()),
            ],
            PartitionScope::Global => vec![(ACCOUNT_COLUMN, self.account_id.as_str())],
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.region)
    }
}

/// How far a resource's listing reaches
///
/// Regional resources are listed and replaced per (account, region). Global
/// resources (IAM and friends) are account-wide: the region only selects the
/// endpoint used to list them and is not part of the stored partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionScope {
    Regional,
    Global,
}

impl PartitionScope {
    pub fn column_names(self) -> &'static [&'static str] {
        match self {
            PartitionScope::Regional => &[ACCOUNT_COLUMN, REGION_COLUMN],
            PartitionScope::Global => &[ACCOUNT_COLUMN],
        }
    }
}
