//! Schema cache (TTL + optional LRU + single-flight) and row validator
//! applied before every storage write (SPEC_FULL §4.4, §4.5).

pub mod cache;
pub mod validator;

pub use cache::{SchemaCache, SchemaCacheConfig, SchemaCacheMetrics};
pub use validator::{validate_rows, LogicalType, ValidatedColumn, ValidationSchema};
