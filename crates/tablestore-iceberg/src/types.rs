//! Iceberg v1 table metadata JSON types (SPEC_FULL §6's "required fields"
//! list). Plain serde structs — kebab-case on the wire, `Option` fields
//! only where absence is actually legal, everything else a required field
//! with a fixed value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tablestore_core::types::{Column, ColumnType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NestedField {
    pub id: i32,
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Schema {
    pub schema_id: i32,
    #[serde(rename = "type")]
    pub schema_type: String,
    pub fields: Vec<NestedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionSpec {
    pub spec_id: i32,
    pub fields: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SortOrder {
    pub order_id: i32,
    pub fields: Vec<Value>,
}

/// The full Iceberg v1 metadata document this crate emits. Field set and
/// required/optional-ness follow SPEC_FULL §6's required-fields list
/// exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableMetadata {
    pub format_version: i32,
    pub table_uuid: String,
    pub location: String,
    pub last_updated_ms: i64,
    pub last_column_id: i32,
    pub schemas: Vec<Schema>,
    pub current_schema_id: i32,
    pub partition_specs: Vec<PartitionSpec>,
    pub default_spec_id: i32,
    pub last_partition_id: i32,
    pub sort_orders: Vec<SortOrder>,
    pub default_sort_order_id: i32,
    pub snapshots: Vec<Value>,
    pub current_snapshot_id: Option<i64>,
    pub refs: HashMap<String, Value>,
    pub snapshot_log: Vec<Value>,
    pub metadata_log: Vec<Value>,
    pub properties: HashMap<String, String>,
}

impl TableMetadata {
    /// Build the v1 document for a freshly created table (SPEC_FULL §4.6).
    /// `table_uuid` and `now_ms` are passed in rather than generated here so
    /// the writer (which owns the clock/RNG call) stays the single place
    /// that needs to be faked in tests.
    pub fn new_v1(
        table_uuid: String,
        location: String,
        now_ms: i64,
        columns: &[Column],
        engine_name: &str,
        engine_version: &str,
    ) -> Self {
        let mut next_id = 1;
        let fields = columns
            .iter()
            .map(|col| column_to_nested_field(col, &mut next_id))
            .collect();

        let mut properties = HashMap::new();
        properties.insert("engine-name".to_string(), engine_name.to_string());
        properties.insert("engine-version".to_string(), engine_version.to_string());

        Self {
            format_version: 2,
            table_uuid,
            location,
            last_updated_ms: now_ms,
            last_column_id: 0,
            schemas: vec![Schema {
                schema_id: 0,
                schema_type: "struct".to_string(),
                fields,
            }],
            current_schema_id: 0,
            partition_specs: vec![PartitionSpec {
                spec_id: 0,
                fields: Vec::new(),
            }],
            default_spec_id: 0,
            last_partition_id: 999,
            sort_orders: vec![SortOrder {
                order_id: 0,
                fields: Vec::new(),
            }],
            default_sort_order_id: 0,
            snapshots: Vec::new(),
            current_snapshot_id: None,
            refs: HashMap::new(),
            snapshot_log: Vec::new(),
            metadata_log: Vec::new(),
            properties,
        }
    }

    pub fn current_schema(&self) -> Option<&Schema> {
        self.schemas
            .iter()
            .find(|s| s.schema_id == self.current_schema_id)
    }
}

fn column_to_nested_field(column: &Column, next_id: &mut i32) -> NestedField {
    let id = *next_id;
    *next_id += 1;
    NestedField {
        id,
        name: column.name.clone(),
        required: !column.nullable,
        field_type: column_type_to_iceberg_type(&column.column_type, next_id),
        doc: None,
    }
}

/// Render a `ColumnType` into the Iceberg JSON type representation:
/// primitives as bare strings, `list`/`map`/`struct` as nested objects with
/// their own field ids, following the Iceberg table spec's type encoding.
fn column_type_to_iceberg_type(ty: &ColumnType, next_id: &mut i32) -> Value {
    match ty {
        ColumnType::Boolean => Value::String("boolean".to_string()),
        ColumnType::Int32 => Value::String("int".to_string()),
        ColumnType::Int64 => Value::String("long".to_string()),
        ColumnType::Float32 => Value::String("float".to_string()),
        ColumnType::Float64 => Value::String("double".to_string()),
        ColumnType::String => Value::String("string".to_string()),
        ColumnType::Binary => Value::String("binary".to_string()),
        ColumnType::Date => Value::String("date".to_string()),
        ColumnType::Time => Value::String("time".to_string()),
        ColumnType::Timestamp => Value::String("timestamp".to_string()),
        ColumnType::TimestampTz => Value::String("timestamptz".to_string()),
        ColumnType::Uuid => Value::String("uuid".to_string()),
        ColumnType::Decimal { precision, scale } => {
            Value::String(format!("decimal({precision},{scale})"))
        }
        ColumnType::List { element } => {
            let element_id = *next_id;
            *next_id += 1;
            serde_json::json!({
                "type": "list",
                "element-id": element_id,
                "element-required": false,
                "element": column_type_to_iceberg_type(element, next_id),
            })
        }
        ColumnType::Map { key, value } => {
            let key_id = *next_id;
            *next_id += 1;
            let value_id = *next_id;
            *next_id += 1;
            serde_json::json!({
                "type": "map",
                "key-id": key_id,
                "key": column_type_to_iceberg_type(key, next_id),
                "value-id": value_id,
                "value-required": false,
                "value": column_type_to_iceberg_type(value, next_id),
            })
        }
        ColumnType::Struct { fields } => {
            let nested: Vec<Value> = fields
                .iter()
                .map(|(name, field_ty)| {
                    let id = *next_id;
                    *next_id += 1;
                    serde_json::json!({
                        "id": id,
                        "name": name,
                        "required": false,
                        "type": column_type_to_iceberg_type(field_ty, next_id),
                    })
                })
                .collect();
            serde_json::json!({
                "type": "struct",
                "fields": nested,
            })
        }
    }
}
