//! Parsed create-table statement and the projection into `Column` records
//! (SPEC_FULL §4.7 `CreateTable` steps 1 and 3).

use serde_json::Value;
use tablestore_core::error::Result;
use tablestore_core::types::{assign_ordinals, Column, ColumnType};

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub type_str: String,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_str: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_str: type_str.into(),
            nullable,
            default: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTableStatement {
    pub columns: Vec<ColumnDef>,
}

impl CreateTableStatement {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Step 1: shape, column-name uniqueness, legal type strings.
    /// Step 3: project into ordinal-assigned `Column` records.
    /// Both steps fail with `invalid-argument` (SPEC_FULL §4.7 step 1; the
    /// duplicate-name check is folded in here rather than repeated, since
    /// `assign_ordinals` already rejects duplicates).
    pub fn validate_and_project(&self) -> Result<Vec<Column>> {
        if self.columns.is_empty() {
            return Err(tablestore_core::error::TablestoreError::invalid_argument(
                "create-table statement has no columns",
            ));
        }

        let mut parsed = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let column_type = ColumnType::parse(&col.type_str).map_err(|e| {
                tablestore_core::error::TablestoreError::invalid_argument(format!(
                    "column '{}': {e}",
                    col.name
                ))
                .with_context("column_name", col.name.clone())
                .with_context("type_str", col.type_str.clone())
            })?;
            parsed.push((col.name.clone(), column_type, col.nullable, col.default.clone()));
        }

        assign_ordinals(parsed)
            .map_err(|e| tablestore_core::error::TablestoreError::invalid_argument(e))
    }
}
