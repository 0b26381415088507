//! Provider item to relational record mapping
//!
//! A transform is a pure function: it reads one raw provider item and the
//! partition it belongs to and returns a root record with its owned
//! children. It never touches storage and never calls the provider.
//!
//! [`map_item`] is the schema-driven transform used by the built-in
//! resources. It maps every declared column from its source path, so a
//! resource only has to declare its [`TableSchema`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as Json;

use crate::partition::{PartitionKey, PartitionScope};
use crate::record::{ChildRecord, Row, RootRecord, Value};
use crate::schema::{Cardinality, ColumnType, TableSchema};

/// Transform signature every descriptor provides
pub type TransformFn = fn(&Json, &TransformContext<'_>) -> RootRecord;

/// Ambient context of a transform: where the item came from
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub partition: &'a PartitionKey,
    pub scope: PartitionScope,
    pub table: &'a TableSchema,
}

impl<'a> TransformContext<'a> {
    pub fn new(partition: &'a PartitionKey, scope: PartitionScope, table: &'a TableSchema) -> Self {
        Self {
            partition,
            scope,
            table,
        }
    }

    /// Root row pre-populated with the partition columns
    pub fn root_row(&self) -> Row {
        let mut row = Row::new();
        for (column, value) in self.partition.columns(self.scope) {
            row.set(column, value);
        }
        row
    }
}

/// Schema-driven transform
pub fn map_item(item: &Json, ctx: &TransformContext<'_>) -> RootRecord {
    let mut row = ctx.root_row();
    fill_columns(&mut row, item, ctx.table);
    RootRecord {
        row,
        children: map_children(item, ctx.table),
    }
}

fn fill_columns(row: &mut Row, item: &Json, table: &TableSchema) {
    for column in table.columns {
        row.set(column.name, coerce(lookup(item, column.source), column.ty));
    }
}

fn map_children(item: &Json, table: &TableSchema) -> Vec<ChildRecord> {
    let mut children = Vec::new();

    for relation in table.children {
        let nested: Vec<&Json> = match (relation.cardinality, lookup(item, relation.source)) {
            (Cardinality::Many, Some(Json::Array(elements))) => elements.iter().collect(),
            (Cardinality::One, Some(object @ Json::Object(_))) => vec![object],
            _ => Vec::new(),
        };

        for element in nested {
            let mut row = Row::new();
            fill_columns(&mut row, element, &relation.table);
            children.push(ChildRecord {
                table: relation.table.name,
                row,
                children: map_children(element, &relation.table),
            });
        }
    }

    children
}

/// Follow a dotted path (`PortRange.From`) into an item
///
/// JSON `null` reads as absent.
pub fn lookup<'j>(item: &'j Json, path: &str) -> Option<&'j Json> {
    let mut current = item;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// Convert a raw JSON value to a column value of `ty`
///
/// Anything that cannot be represented faithfully becomes `Null` rather than
/// a made-up default.
pub fn coerce(raw: Option<&Json>, ty: ColumnType) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };

    match ty {
        ColumnType::Text => match raw {
            Json::String(s) => Value::Text(s.clone()),
            Json::Number(n) => Value::Text(n.to_string()),
            Json::Bool(b) => Value::Text(b.to_string()),
            _ => Value::Null,
        },
        ColumnType::BigInt => match raw {
            Json::Number(n) => n.as_i64().map(Value::BigInt).unwrap_or(Value::Null),
            Json::String(s) => s.trim().parse().map(Value::BigInt).unwrap_or(Value::Null),
            _ => Value::Null,
        },
        ColumnType::Boolean => match raw {
            Json::Bool(b) => Value::Boolean(*b),
            Json::String(s) if s.eq_ignore_ascii_case("true") => Value::Boolean(true),
            Json::String(s) if s.eq_ignore_ascii_case("false") => Value::Boolean(false),
            _ => Value::Null,
        },
        ColumnType::Timestamp => parse_timestamp(raw).map(Value::Timestamp).unwrap_or(Value::Null),
        ColumnType::Json => Value::Json(raw.clone()),
    }
}

/// RFC 3339 strings or epoch seconds (integral or fractional)
fn parse_timestamp(raw: &Json) -> Option<DateTime<Utc>> {
    match raw {
        Json::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Json::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            // Whole seconds round down so the fraction is always non-negative
            let mut whole = secs.floor() as i64;
            let mut nanos = ((secs - secs.floor()) * 1e9).round() as u32;
            if nanos >= 1_000_000_000 {
                whole += 1;
                nanos = 0;
            }
            Utc.timestamp_opt(whole, nanos).single()
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::{Column, Relation};
    use serde_json::json;

    const TAGS: TableSchema = TableSchema::new(
        "gw_tags",
        &[Column::text("key", "Key"), Column::text("value", "Value")],
        &[],
    );
    const GATEWAYS: TableSchema = TableSchema::new(
        "gateways",
        &[
            Column::text("gateway_id", "GatewayId"),
            Column::bigint("asn", "Asn"),
            Column::boolean("is_default", "IsDefault"),
            Column::timestamp("create_time", "CreateTime"),
            Column::text("bandwidth_status", "Bandwidth.Status"),
            Column::bigint("port_range_from", "PortRange.From"),
        ],
        &[Relation::many("Tags", TAGS)],
    );

    fn partition() -> PartitionKey {
        PartitionKey::new("111122223333", "us-west-2")
    }

    #[test]
    fn test_map_item_sets_partition_and_columns() {
        let item = json!({
            "GatewayId": "gw-1",
            "Asn": 64512,
            "IsDefault": false,
            "CreateTime": "2021-03-04T05:06:07Z",
            "Bandwidth": {"Status": "ok"},
            "PortRange": {"From": 0}
        });
        let partition = partition();
        let ctx = TransformContext::new(&partition, PartitionScope::Regional, &GATEWAYS);
        let record = map_item(&item, &ctx);

        assert_eq!(record.row.get("account_id"), &Value::from("111122223333"));
        assert_eq!(record.row.get("region"), &Value::from("us-west-2"));
        assert_eq!(record.row.get("gateway_id"), &Value::from("gw-1"));
        assert_eq!(record.row.get("asn"), &Value::BigInt(64512));
        assert_eq!(record.row.get("is_default"), &Value::Boolean(false));
        assert_eq!(record.row.get("bandwidth_status"), &Value::from("ok"));
        assert_eq!(record.row.get("port_range_from"), &Value::BigInt(0));
        assert_eq!(
            record.row.get("create_time"),
            &Value::Timestamp(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap())
        );
    }

    #[test]
    fn test_absent_fields_are_null_not_zero() {
        let partition = partition();
        let ctx = TransformContext::new(&partition, PartitionScope::Regional, &GATEWAYS);
        let record = map_item(&json!({"GatewayId": "gw-2", "Asn": null}), &ctx);

        for column in ["asn", "is_default", "create_time", "bandwidth_status", "port_range_from"] {
            assert!(record.row.get(column).is_null(), "{column} should be null");
        }
        assert!(record.children.is_empty());
    }

    #[test]
    fn test_tags_become_children() {
        let partition = partition();
        let ctx = TransformContext::new(&partition, PartitionScope::Regional, &GATEWAYS);
        let record = map_item(
            &json!({
                "GatewayId": "gw-3",
                "Tags": [{"Key": "env", "Value": "prod"}, {"Key": "team"}]
            }),
            &ctx,
        );

        assert_eq!(record.children.len(), 2);
        assert!(record.children.iter().all(|c| c.table == "gw_tags"));
        assert_eq!(record.children[0].row.get("value"), &Value::from("prod"));
        assert!(record.children[1].row.get("value").is_null());
    }

    #[test]
    fn test_global_scope_has_no_region_column() {
        let partition = partition();
        let ctx = TransformContext::new(&partition, PartitionScope::Global, &GATEWAYS);
        let row = ctx.root_row();
        assert_eq!(row.len(), 1);
        assert!(row.get("region").is_null());
    }

    #[test]
    fn test_coerce_rules() {
        assert_eq!(coerce(Some(&json!(7)), ColumnType::Text), Value::from("7"));
        assert_eq!(coerce(Some(&json!("42")), ColumnType::BigInt), Value::BigInt(42));
        assert_eq!(coerce(Some(&json!(1.5)), ColumnType::BigInt), Value::Null);
        assert_eq!(coerce(Some(&json!("TRUE")), ColumnType::Boolean), Value::Boolean(true));
        assert_eq!(coerce(Some(&json!({"a": 1})), ColumnType::Text), Value::Null);
        assert_eq!(coerce(Some(&json!("yesterday")), ColumnType::Timestamp), Value::Null);
        assert_eq!(
            coerce(Some(&json!(1_600_000_000)), ColumnType::Timestamp),
            Value::Timestamp(Utc.timestamp_opt(1_600_000_000, 0).unwrap())
        );
        assert_eq!(
            coerce(Some(&json!(["a"])), ColumnType::Json),
            Value::Json(json!(["a"]))
        );
    }

    #[test]
    fn test_fractional_epoch_timestamps() {
        let at = |secs: f64| match coerce(Some(&json!(secs)), ColumnType::Timestamp) {
            Value::Timestamp(ts) => ts.timestamp_millis(),
            other => panic!("expected timestamp, got {other:?}"),
        };
        assert_eq!(at(1.25), 1_250);
        assert_eq!(at(-1.5), -1_500);
        assert_eq!(at(-0.25), -250);
    }

    #[test]
    fn test_lookup_treats_null_and_non_objects_as_absent() {
        let item = json!({"A": {"B": null}, "C": 3});
        assert!(lookup(&item, "A.B").is_none());
        assert!(lookup(&item, "C.D").is_none());
        assert_eq!(lookup(&item, "C"), Some(&json!(3)));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let partition = partition();
        let ctx = TransformContext::new(&partition, PartitionScope::Regional, &GATEWAYS);
        let item = json!({"GatewayId": "gw-4", "Tags": [{"Key": "a", "Value": "b"}]});
        assert_eq!(map_item(&item, &ctx), map_item(&item, &ctx));
    }
}
