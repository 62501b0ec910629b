//! In-memory storage engine backed by `opendal::services::Memory`. Used for
//! tests and as the registry's last-resort default when no durable backend
//! is configured (SPEC_FULL §4.2, §4.3).

use crate::contract::StorageEngine;
use async_trait::async_trait;
use futures_util::StreamExt;
use opendal::{services, Operator};
use tablestore_core::error::Result;

pub struct MemoryEngine {
    operator: Operator,
}

impl MemoryEngine {
    pub fn new() -> Self {
        let operator = Operator::new(services::Memory::default())
            .expect("memory backend builder never fails")
            .finish();
        Self { operator }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(self.operator.read(path).await?.to_vec())
    }

    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        self.operator.write(path, bytes).await?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        self.operator.delete(path).await?;
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.operator.exists(path).await?)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let mut lister = self.operator.lister(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = lister.next().await {
            names.push(entry?.path().to_string());
        }
        Ok(names)
    }

    async fn setup_table(&self, _database: &str, _table: &str) -> Result<()> {
        // The memory backend has no directory structure to pre-create; the
        // first write to a table path creates it implicitly.
        Ok(())
    }

    async fn remove_table_environment(&self, database: &str, table: &str) -> Result<()> {
        let prefix = format!("tables/{database}/{table}/");
        self.operator.remove_all(&prefix).await?;
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }

    fn operator(&self) -> &Operator {
        &self.operator
    }
}
