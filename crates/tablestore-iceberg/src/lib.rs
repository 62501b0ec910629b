//! Iceberg v1 metadata JSON types and the atomic metadata writer
//! (SPEC_FULL §4.6).

pub mod types;
pub mod writer;

pub use types::{NestedField, PartitionSpec, Schema, SortOrder, TableMetadata};
pub use writer::IcebergMetadataWriter;
