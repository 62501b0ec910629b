//! The `StorageEngine` contract every backend variant implements
//! independently (SPEC_FULL §4.2: "variants share no code beyond the
//! contract" — each wraps its own `opendal::Operator`).

use async_trait::async_trait;
use tablestore_core::error::Result;

#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Read an entire object into memory. Used for metadata files, which are
    /// small by construction (SPEC_FULL §6).
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Write an entire object, overwriting whatever is at `path`.
    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> Result<()>;

    async fn remove_file(&self, path: &str) -> Result<()>;

    async fn file_exists(&self, path: &str) -> Result<bool>;

    /// Non-recursive listing of entries directly under `path`.
    async fn list_dir(&self, path: &str) -> Result<Vec<String>>;

    /// Create whatever directory/prefix structure a new table needs before
    /// its first write (CreateTable step, SPEC_FULL §4.7).
    async fn setup_table(&self, database: &str, table: &str) -> Result<()>;

    /// Remove everything under a table's root (DropTable step, SPEC_FULL
    /// §4.7). Must not error if the table environment is already gone.
    async fn remove_table_environment(&self, database: &str, table: &str) -> Result<()>;

    /// One of `"memory"`, `"filesystem"`, `"s3"` — used for registry listing
    /// and log/error context, never for branching in caller code.
    fn storage_type(&self) -> &'static str;

    /// Direct access to the underlying operator for callers (the Iceberg
    /// writer) that need streaming writes rather than whole-buffer ones.
    fn operator(&self) -> &opendal::Operator;
}
