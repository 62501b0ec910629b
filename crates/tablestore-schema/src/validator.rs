//! Two-stage schema validation applied before any storage write
//! (SPEC_FULL §4.5): convert a table's declared columns into a flattened
//! `ValidationSchema`, then fail-fast validate a row batch against it.
//! Validation mutates nothing — no side effects, no i/o.

use serde_json::Value;
use tablestore_core::error::{ErrorKind, Result, TablestoreError};
use tablestore_core::types::ColumnType;
use tablestore_core::TableFormatSchema;

/// `ColumnType` flattened for matching against dynamic `serde_json::Value`
/// row data. Mirrors `ColumnType` one-to-one; kept as a separate type so the
/// validator never has to reach back into the Iceberg type-string grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Binary,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Decimal { precision: u32, scale: u32 },
    List { element: Box<LogicalType> },
    Map { key: Box<LogicalType>, value: Box<LogicalType> },
    Struct { fields: Vec<(String, LogicalType)> },
}

impl LogicalType {
    fn name(&self) -> String {
        match self {
            LogicalType::Boolean => "boolean".to_string(),
            LogicalType::Int32 => "int32".to_string(),
            LogicalType::Int64 => "int64".to_string(),
            LogicalType::Float32 => "float32".to_string(),
            LogicalType::Float64 => "float64".to_string(),
            LogicalType::String => "string".to_string(),
            LogicalType::Binary => "binary".to_string(),
            LogicalType::Date => "date".to_string(),
            LogicalType::Time => "time".to_string(),
            LogicalType::Timestamp => "timestamp".to_string(),
            LogicalType::TimestampTz => "timestamptz".to_string(),
            LogicalType::Uuid => "uuid".to_string(),
            LogicalType::Decimal { precision, scale } => format!("decimal({precision},{scale})"),
            LogicalType::List { element } => format!("list<{}>", element.name()),
            LogicalType::Map { key, value } => format!("map<{},{}>", key.name(), value.name()),
            LogicalType::Struct { fields } => {
                let inner = fields
                    .iter()
                    .map(|(n, t)| format!("{n}:{}", t.name()))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("struct<{inner}>")
            }
        }
    }
}

impl From<&ColumnType> for LogicalType {
    fn from(ty: &ColumnType) -> Self {
        match ty {
            ColumnType::Boolean => LogicalType::Boolean,
            ColumnType::Int32 => LogicalType::Int32,
            ColumnType::Int64 => LogicalType::Int64,
            ColumnType::Float32 => LogicalType::Float32,
            ColumnType::Float64 => LogicalType::Float64,
            ColumnType::String => LogicalType::String,
            ColumnType::Binary => LogicalType::Binary,
            ColumnType::Date => LogicalType::Date,
            ColumnType::Time => LogicalType::Time,
            ColumnType::Timestamp => LogicalType::Timestamp,
            ColumnType::TimestampTz => LogicalType::TimestampTz,
            ColumnType::Uuid => LogicalType::Uuid,
            ColumnType::Decimal { precision, scale } => LogicalType::Decimal {
                precision: *precision,
                scale: *scale,
            },
            ColumnType::List { element } => LogicalType::List {
                element: Box::new(LogicalType::from(element.as_ref())),
            },
            ColumnType::Map { key, value } => LogicalType::Map {
                key: Box::new(LogicalType::from(key.as_ref())),
                value: Box::new(LogicalType::from(value.as_ref())),
            },
            ColumnType::Struct { fields } => LogicalType::Struct {
                fields: fields
                    .iter()
                    .map(|(n, t)| (n.clone(), LogicalType::from(t)))
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedColumn {
    pub name: String,
    pub logical_type: LogicalType,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub struct ValidationSchema {
    pub columns: Vec<ValidatedColumn>,
}

impl ValidationSchema {
    /// Schema conversion. Conversion itself cannot fail for a well-formed
    /// `TableFormatSchema` — every `ColumnType` has a direct `LogicalType`
    /// counterpart — but the table metadata it's built from could in
    /// principle be empty, which is still a legal (if useless) schema.
    pub fn from_table_schema(schema: &TableFormatSchema) -> Self {
        let columns = schema
            .iter()
            .map(|col| ValidatedColumn {
                name: col.name.clone(),
                logical_type: LogicalType::from(&col.column_type),
                nullable: col.nullable,
            })
            .collect();
        Self { columns }
    }
}

/// Validate `rows` against `schema`, database/table supplied only for error
/// context. Returns on the first violating row (SPEC_FULL §4.5 "fail fast").
pub fn validate_rows(
    database: &str,
    table: &str,
    schema: &ValidationSchema,
    rows: &[Vec<Value>],
) -> Result<()> {
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != schema.columns.len() {
            return Err(TablestoreError::validation_failed(format!(
                "row {row_index} has {} columns, expected {}",
                row.len(),
                schema.columns.len()
            ))
            .with_context("database", database)
            .with_context("table", table)
            .with_context("row", row_index.to_string())
            .with_context("expected", schema.columns.len().to_string())
            .with_context("got", row.len().to_string()));
        }

        for (col_index, (column, value)) in schema.columns.iter().zip(row.iter()).enumerate() {
            if value.is_null() {
                if column.nullable {
                    continue;
                }
                return Err(validation_error(
                    database, table, row_index, col_index, column, value,
                ));
            }
            if !matches_logical_type(&column.logical_type, value) {
                return Err(validation_error(
                    database, table, row_index, col_index, column, value,
                ));
            }
        }
    }
    Ok(())
}

fn validation_error(
    database: &str,
    table: &str,
    row_index: usize,
    col_index: usize,
    column: &ValidatedColumn,
    value: &Value,
) -> TablestoreError {
    TablestoreError::new(
        ErrorKind::ValidationFailed,
        format!(
            "row {row_index} column {col_index} ({}): expected {}, got {}",
            column.name,
            column.logical_type.name(),
            value_repr(value)
        ),
    )
    .with_context("database", database)
    .with_context("table", table)
    .with_context("row", row_index.to_string())
    .with_context("column", col_index.to_string())
    .with_context("column_name", column.name.clone())
    .with_context("expected_type", column.logical_type.name())
    .with_context("actual_type", value_type_name(value))
    .with_context("value", value_repr(value))
}

fn value_repr(value: &Value) -> String {
    if value.is_null() {
        "null".to_string()
    } else {
        value.to_string()
    }
}

/// Dynamic type name of a `serde_json::Value`, for `actual_type` error
/// context alongside `expected_type`.
fn value_type_name(value: &Value) -> &'static str {
    if value.is_null() {
        "null"
    } else if value.is_boolean() {
        "boolean"
    } else if value.is_number() {
        "number"
    } else if value.is_string() {
        "string"
    } else if value.is_array() {
        "array"
    } else {
        "object"
    }
}

/// No numeric promotions across integer/float widths or from strings
/// (SPEC_FULL §4.5): a declared `int64` rejects a `Value::String` that
/// happens to parse as an integer.
fn matches_logical_type(ty: &LogicalType, value: &Value) -> bool {
    match ty {
        LogicalType::Boolean => value.is_boolean(),
        LogicalType::Int32 => value.as_i64().map(|v| v >= i32::MIN as i64 && v <= i32::MAX as i64).unwrap_or(false),
        LogicalType::Int64 => value.is_i64() || value.is_u64(),
        LogicalType::Float32 | LogicalType::Float64 => value.is_number(),
        LogicalType::String | LogicalType::Date | LogicalType::Time | LogicalType::Timestamp
        | LogicalType::TimestampTz | LogicalType::Uuid => value.is_string(),
        LogicalType::Binary => value.is_string(),
        LogicalType::Decimal { .. } => value.is_string() || value.is_number(),
        LogicalType::List { element } => value
            .as_array()
            .map(|arr| arr.iter().all(|v| v.is_null() || matches_logical_type(element, v)))
            .unwrap_or(false),
        LogicalType::Map { value: value_ty, .. } => value
            .as_object()
            .map(|obj| obj.values().all(|v| v.is_null() || matches_logical_type(value_ty, v)))
            .unwrap_or(false),
        LogicalType::Struct { fields } => value
            .as_object()
            .map(|obj| {
                fields.iter().all(|(name, field_ty)| match obj.get(name) {
                    Some(v) if v.is_null() => true,
                    Some(v) => matches_logical_type(field_ty, v),
                    None => false,
                })
            })
            .unwrap_or(false),
    }
}
