//! Data model shared across the storage engine, schema, iceberg and manager
//! crates. Kept free of any I/O so every other crate can depend on it
//! without pulling in `tokio`/`opendal`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named container for tables. Persistence is owned by the external
/// `MetadataManager`; this struct is just the shape of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A table identified by `(database, name)`. The storage engine tag is
/// immutable once the table is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub database: String,
    pub name: String,
    pub storage_engine: String,
    pub row_count: i64,
    pub file_count: i64,
    pub total_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One column of a table's declared schema.
///
/// `ordinal` is 1-based and dense within a table: the sequence
/// `1..=columns.len()` with no gaps, enforced by
/// [`crate::types::assign_ordinals`] at table-creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub ordinal: u32,
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<serde_json::Value>,
}

/// The cached/validated shape of a table: its declared columns in ordinal
/// order. What the Schema Cache stores and what the Schema Validator
/// converts into a [`crate::types::ColumnType`]-free row-validation schema.
pub type TableFormatSchema = Vec<Column>;

/// Append-only record of a single write. Never mutated after creation;
/// removed only as a side effect of `DropTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub file_type: DataFileType,
    pub row_count: i64,
    pub checksum: String,
    pub compressed: bool,
    pub partition_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFileType {
    Parquet,
}

/// The table-format type vocabulary: primitives plus recursively nested
/// `list`/`map`/`struct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ColumnType {
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
    List { element: Box<ColumnType> },
    Map { key: Box<ColumnType>, value: Box<ColumnType> },
    Struct { fields: Vec<(String, ColumnType)> },
}

impl ColumnType {
    /// Render back to the canonical type string, the inverse of
    /// [`ColumnType::parse`]. Used when emitting Iceberg schema JSON.
    pub fn to_type_string(&self) -> String {
        match self {
            ColumnType::Boolean => "boolean".to_string(),
            ColumnType::Int32 => "int32".to_string(),
            ColumnType::Int64 => "int64".to_string(),
            ColumnType::Float32 => "float32".to_string(),
            ColumnType::Float64 => "float64".to_string(),
            ColumnType::String => "string".to_string(),
            ColumnType::Binary => "binary".to_string(),
            ColumnType::Date => "date".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Timestamp => "timestamp".to_string(),
            ColumnType::TimestampTz => "timestamptz".to_string(),
            ColumnType::Uuid => "uuid".to_string(),
            ColumnType::Decimal { precision, scale } => format!("decimal({precision},{scale})"),
            ColumnType::List { element } => format!("list<{}>", element.to_type_string()),
            ColumnType::Map { key, value } => {
                format!("map<{},{}>", key.to_type_string(), value.to_type_string())
            }
            ColumnType::Struct { fields } => {
                let inner = fields
                    .iter()
                    .map(|(name, ty)| format!("{name}:{}", ty.to_type_string()))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("struct<{inner}>")
            }
        }
    }

    /// Parse a declared type string into a [`ColumnType`].
    ///
    /// A small recursive-descent parser rather than a regex: `struct<...>`
    /// and `map<...>` fields can themselves contain arbitrarily nested
    /// `list<...>`/`struct<...>`, and balancing angle brackets with a regex
    /// gets unreadable fast.
    pub fn parse(type_str: &str) -> Result<Self, String> {
        let mut parser = TypeParser {
            chars: type_str.trim().chars().collect(),
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.expect_end()?;
        Ok(ty)
    }
}

struct TypeParser {
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect_end(&self) -> Result<(), String> {
        if self.pos == self.chars.len() {
            Ok(())
        } else {
            Err(format!(
                "unexpected trailing characters at position {}",
                self.pos
            ))
        }
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, pred: F) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn expect_char(&mut self, expected: char) -> Result<(), String> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            other => Err(format!("expected '{expected}', found {other:?}")),
        }
    }

    fn parse_type(&mut self) -> Result<ColumnType, String> {
        let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
        if name.is_empty() {
            return Err(format!("expected a type name at position {}", self.pos));
        }
        match name.as_str() {
            "boolean" => Ok(ColumnType::Boolean),
            "int32" => Ok(ColumnType::Int32),
            "int64" => Ok(ColumnType::Int64),
            "float32" => Ok(ColumnType::Float32),
            "float64" => Ok(ColumnType::Float64),
            "string" => Ok(ColumnType::String),
            "binary" => Ok(ColumnType::Binary),
            "date" => Ok(ColumnType::Date),
            "time" => Ok(ColumnType::Time),
            "timestamp" => Ok(ColumnType::Timestamp),
            "timestamptz" => Ok(ColumnType::TimestampTz),
            "uuid" => Ok(ColumnType::Uuid),
            "decimal" => self.parse_decimal(),
            "list" => self.parse_list(),
            "map" => self.parse_map(),
            "struct" => self.parse_struct(),
            other => Err(format!("unknown type: {other}")),
        }
    }

    fn parse_decimal(&mut self) -> Result<ColumnType, String> {
        self.expect_char('(')?;
        let precision = self.take_while(|c| c.is_ascii_digit());
        self.expect_char(',')?;
        let scale = self.take_while(|c| c.is_ascii_digit());
        self.expect_char(')')?;
        let precision = precision
            .parse::<u32>()
            .map_err(|_| "invalid decimal precision".to_string())?;
        let scale = scale
            .parse::<u32>()
            .map_err(|_| "invalid decimal scale".to_string())?;
        Ok(ColumnType::Decimal { precision, scale })
    }

    fn parse_list(&mut self) -> Result<ColumnType, String> {
        self.expect_char('<')?;
        let element = self.parse_type()?;
        self.expect_char('>')?;
        Ok(ColumnType::List {
            element: Box::new(element),
        })
    }

    fn parse_map(&mut self) -> Result<ColumnType, String> {
        self.expect_char('<')?;
        let key = self.parse_type()?;
        self.expect_char(',')?;
        let value = self.parse_type()?;
        self.expect_char('>')?;
        Ok(ColumnType::Map {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    fn parse_struct(&mut self) -> Result<ColumnType, String> {
        self.expect_char('<')?;
        let mut fields = Vec::new();
        loop {
            let field_name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            if field_name.is_empty() {
                return Err(format!(
                    "expected a struct field name at position {}",
                    self.pos
                ));
            }
            self.expect_char(':')?;
            let field_type = self.parse_type()?;
            fields.push((field_name, field_type));
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                other => return Err(format!("expected ',' or '>', found {other:?}")),
            }
        }
        Ok(ColumnType::Struct { fields })
    }
}

/// Assign dense 1-based ordinal positions in declared order, and reject
/// duplicate column names. Used by `CreateTable` projection (spec §4.7
/// step 3).
pub fn assign_ordinals(
    names_and_types: Vec<(String, ColumnType, bool, Option<serde_json::Value>)>,
) -> Result<Vec<Column>, String> {
    let mut seen = std::collections::HashSet::new();
    let mut columns = Vec::with_capacity(names_and_types.len());
    for (ordinal, (name, column_type, nullable, default)) in
        names_and_types.into_iter().enumerate()
    {
        if !seen.insert(name.clone()) {
            return Err(format!("duplicate column name: {name}"));
        }
        columns.push(Column {
            ordinal: ordinal as u32 + 1,
            name,
            column_type,
            nullable,
            default,
        });
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitives() {
        for s in [
            "boolean",
            "int32",
            "int64",
            "float32",
            "float64",
            "string",
            "binary",
            "date",
            "time",
            "timestamp",
            "timestamptz",
            "uuid",
        ] {
            let parsed = ColumnType::parse(s).unwrap();
            assert_eq!(parsed.to_type_string(), s);
        }
    }

    #[test]
    fn parses_decimal() {
        let parsed = ColumnType::parse("decimal(10,2)").unwrap();
        assert_eq!(parsed, ColumnType::Decimal { precision: 10, scale: 2 });
        assert_eq!(parsed.to_type_string(), "decimal(10,2)");
    }

    #[test]
    fn parses_nested_list_of_struct() {
        let parsed = ColumnType::parse("list<struct<a:int32,b:list<string>>>").unwrap();
        assert_eq!(parsed.to_type_string(), "list<struct<a:int32,b:list<string>>>");
    }

    #[test]
    fn parses_map() {
        let parsed = ColumnType::parse("map<string,int64>").unwrap();
        assert_eq!(parsed.to_type_string(), "map<string,int64>");
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(ColumnType::parse("notatype").is_err());
    }

    #[test]
    fn rejects_malformed_nesting() {
        assert!(ColumnType::parse("list<string").is_err());
        assert!(ColumnType::parse("struct<a:int32").is_err());
    }

    #[test]
    fn assigns_dense_ordinals() {
        let columns = assign_ordinals(vec![
            ("id".to_string(), ColumnType::Int64, false, None),
            ("name".to_string(), ColumnType::String, true, None),
        ])
        .unwrap();
        assert_eq!(columns[0].ordinal, 1);
        assert_eq!(columns[1].ordinal, 2);
    }

    #[test]
    fn rejects_duplicate_column_names() {
        let err = assign_ordinals(vec![
            ("id".to_string(), ColumnType::Int64, false, None),
            ("id".to_string(), ColumnType::String, true, None),
        ])
        .unwrap_err();
        assert!(err.contains("duplicate"));
    }
}
