//! The `MetadataManager` collaborator contract (SPEC_FULL §6 "Minimum set")
//! and the record type it hands back for a loaded table.

use async_trait::async_trait;
use tablestore_core::error::Result;
use tablestore_core::types::{Column, DataFile, Table, TableFormatSchema};
use tablestore_core::RequestContext;

/// Everything the Storage Manager needs to know about a table once loaded:
/// the row plus its recorded data files. Schema itself is fetched
/// separately through [`MetadataManager::load_schema`] since the schema
/// cache keys on it independently of the rest of the row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadataRecord {
    pub table: Table,
    pub files: Vec<DataFile>,
}

/// The catalog/metadata collaborator the Storage Manager delegates all
/// durable bookkeeping to. The Storage Manager owns no persistence of its
/// own — every method here corresponds 1:1 to a step in SPEC_FULL §4.7's
/// `CreateTable`/`InsertData`/`GetTableData`/`DropTable`/listing contracts.
///
/// `CreateSchemaDataLoader` from the originating interface is not carried
/// over as a stored closure factory: Rust call sites just build the ad-hoc
/// future inline (see `StorageManager::load_schema`), so no factory
/// method is needed on the trait itself.
#[async_trait]
pub trait MetadataManager: Send + Sync {
    async fn table_exists(&self, ctx: &RequestContext, database: &str, table: &str) -> Result<bool>;

    async fn load_table_metadata(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
    ) -> Result<TableMetadataRecord>;

    /// Inserts the row and its columns, returning the newly assigned table
    /// id. Fails with `already-exists` if `(database, table)` is taken.
    async fn create_table_with_schema(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
        storage_engine: &str,
        columns: Vec<Column>,
    ) -> Result<i64>;

    /// Appends `file` to the table's file list and updates its row/file/byte
    /// counters. Callers treat failure here as non-fatal (SPEC_FULL §9):
    /// the data is already durable on the engine, so this is logged and
    /// swallowed rather than propagated.
    async fn update_table_after_insertion(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
        file: DataFile,
    ) -> Result<()>;

    async fn list_tables(&self, ctx: &RequestContext, database: &str) -> Result<Vec<String>>;

    async fn list_all_tables(&self, ctx: &RequestContext) -> Result<Vec<(String, String)>>;

    async fn list_databases(&self, ctx: &RequestContext) -> Result<Vec<String>>;

    async fn database_exists(&self, ctx: &RequestContext, database: &str) -> Result<bool>;

    async fn create_database(&self, ctx: &RequestContext, database: &str) -> Result<()>;

    /// Removes the catalog row for `(database, table)`. `StorageManager::drop_table`
    /// calls this before the engine's own `remove_table_environment` (SPEC_FULL §9
    /// open question 5 — see DESIGN.md): the row disappears from
    /// `ListTables`/`TableExists` first, so a failure in the engine-side removal
    /// leaves an orphaned environment rather than a dangling catalog reference.
    async fn drop_table(&self, ctx: &RequestContext, database: &str, table: &str) -> Result<()>;

    async fn load_schema(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
    ) -> Result<TableFormatSchema>;

    async fn retrieve_all_schemas(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<((String, String), TableFormatSchema)>>;
}
