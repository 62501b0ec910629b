//! Shared types, error kinds, and path layout for the table storage core.
//!
//! This crate has no async runtime dependency beyond `tokio::time::Instant`
//! and no storage-backend dependency beyond the `opendal::Error` conversion
//! in [`error`] — every other crate in the workspace builds on top of it.

pub mod context;
pub mod error;
pub mod path;
pub mod types;

pub use context::RequestContext;
pub use error::{ErrorKind, Result, TablestoreError};
pub use path::{CatalogType, PathManager};
pub use types::{
    assign_ordinals, Column, ColumnType, Database, DataFile, DataFileType, Table,
    TableFormatSchema,
};
