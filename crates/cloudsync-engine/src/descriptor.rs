//! Per-resource declarations driving the generic engine
//!
//! A resource contributes data only: which list call to make, how its
//! configuration decodes into a typed request, how an item maps to records,
//! and where those records are stored. Control flow lives in the pipeline.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

use crate::partition::PartitionScope;
use crate::schema::TableSchema;
use crate::transform::TransformFn;

/// Provider list call and the shape of its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOperation {
    /// Provider service, e.g. `ec2`
    pub service: &'static str,
    /// List action, e.g. `DescribeNatGateways`
    pub action: &'static str,
    /// Response field holding the page's items
    pub items_field: &'static str,
    /// Response field holding the continuation cursor
    pub cursor_field: &'static str,
}

/// A decoded, typed list request as seen by the pagination driver
pub trait ListRequest: Send + Sync + fmt::Debug {
    /// Point the request at the page after `cursor`
    fn set_cursor(&mut self, cursor: String);

    /// Wire form handed to the provider
    fn to_params(&self) -> Result<serde_json::Value, serde_json::Error>;
}

/// Typed request of one resource
///
/// Implemented by each resource's serde request struct. Decoding should be
/// strict (`deny_unknown_fields`) so malformed configuration is reported
/// instead of silently ignored.
pub trait PaginatedInput:
    Serialize + DeserializeOwned + Default + fmt::Debug + Send + Sync + 'static
{
    fn set_cursor(&mut self, cursor: String);
}

impl<T: PaginatedInput> ListRequest for T {
    fn set_cursor(&mut self, cursor: String) {
        PaginatedInput::set_cursor(self, cursor);
    }

    fn to_params(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Decode untyped configuration into a typed request
pub type DecodeFn = fn(serde_json::Value) -> Result<Box<dyn ListRequest>, serde_json::Error>;

/// Decode untyped configuration into `T`
///
/// A missing configuration (`null`) yields the default request.
pub fn decode_request<T: PaginatedInput>(
    raw: serde_json::Value,
) -> Result<Box<dyn ListRequest>, serde_json::Error> {
    if raw.is_null() {
        return Ok(Box::new(T::default()));
    }
    let request: T = serde_json::from_value(raw)?;
    Ok(Box::new(request))
}

/// Static description of one resource type
pub struct ResourceDescriptor {
    /// Registry key, e.g. `ec2.nat_gateways`
    pub name: &'static str,
    pub operation: ListOperation,
    pub scope: PartitionScope,
    pub table: TableSchema,
    pub decode: DecodeFn,
    pub transform: TransformFn,
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .field("scope", &self.scope)
            .field("table", &self.table.name)
            .finish()
    }
}
