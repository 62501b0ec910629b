//! Table storage core for a lakehouse-style data service.
//!
//! `tablestore` composes a pluggable storage engine registry
//! ([`tablestore_engine`]), a schema cache and validator
//! ([`tablestore_schema`]), an atomic metadata update path
//! ([`tablestore_manager`]), and an Iceberg-compatible metadata emitter
//! ([`tablestore_iceberg`]) behind a single [`StorageManager`] entry point.
//! Shared types, error kinds, and on-disk path layout live in
//! [`tablestore_core`].
//!
//! This crate re-exports the pieces most callers need so a single
//! `tablestore` dependency is enough to build and run the whole stack.

mod config;
mod logging;

pub use config::{CatalogTypeConfig, LoggingSection, SchemaCacheSection, StorageSection, TablestoreConfig};
pub use logging::init_tracing;

pub use tablestore_core::error::{ErrorKind, Result, TablestoreError};
pub use tablestore_core::path::{CatalogType, PathManager};
pub use tablestore_core::types::{
    assign_ordinals, Column, ColumnType, Database, DataFile, DataFileType, Table,
    TableFormatSchema,
};
pub use tablestore_core::RequestContext;

pub use tablestore_engine::{EngineRegistry, StorageEngine, FILESYSTEM, MEMORY, S3};
pub use tablestore_schema::{LogicalType, SchemaCache, SchemaCacheConfig, ValidatedColumn};

pub use tablestore_iceberg::{IcebergMetadataWriter, TableMetadata};

pub use tablestore_manager::{
    ColumnDef, CreateTableResponse, CreateTableStatement, InMemoryMetadataManager, MetadataManager,
    StorageManager, StorageManagerConfig,
};

use std::sync::Arc;

/// Build a [`StorageManager`] straight from a loaded [`TablestoreConfig`]
/// and a caller-supplied [`MetadataManager`]. Most callers that are not
/// assembling a custom engine registry or metadata catalog want this over
/// calling `StorageManager::new` directly.
pub fn build_storage_manager(
    config: &TablestoreConfig,
    metadata: Arc<dyn MetadataManager>,
) -> tablestore_core::error::Result<StorageManager> {
    StorageManager::new(config.storage_manager_config(), metadata)
}
