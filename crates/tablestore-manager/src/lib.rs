//! The Storage Manager orchestrator, the `MetadataManager` collaborator
//! contract it delegates to, and a test/reference implementation of that
//! contract (SPEC_FULL §4.7, §6).

pub mod manager;
pub mod memory_metadata;
pub mod metadata;
pub mod statement;

pub use manager::{
    CreateTableResponse, CreateTableResponseMetadata, StorageManager, StorageManagerConfig,
};
pub use memory_metadata::InMemoryMetadataManager;
pub use metadata::{MetadataManager, TableMetadataRecord};
pub use statement::{ColumnDef, CreateTableStatement};
