//! Local-disk storage engine backed by `opendal::services::Fs`, rooted at a
//! configured base directory (SPEC_FULL §4.2, §6 `PathManager`).

use crate::contract::StorageEngine;
use async_trait::async_trait;
use futures_util::StreamExt;
use opendal::{services, Operator};
use std::path::Path;
use tablestore_core::error::Result;

pub struct FilesystemEngine {
    operator: Operator,
    root: String,
}

impl FilesystemEngine {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let builder = services::Fs::default().root(&root.to_string_lossy());
        let operator = Operator::new(builder)?.finish();
        Ok(Self {
            operator,
            root: root.to_string_lossy().into_owned(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }
}

#[async_trait]
impl StorageEngine for FilesystemEngine {
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

    async fn setup_table(&self, database: &str, table: &str) -> Result<()> {
        for suffix in ["data", "metadata", "manifests"] {
            let path = format!("tables/{database}/{table}/{suffix}/.keep");
            self.operator.write(&path, Vec::new()).await?;
        }
        Ok(())
    }

    async fn remove_table_environment(&self, database: &str, table: &str) -> Result<()> {
        let prefix = format!("tables/{database}/{table}/");
        self.operator.remove_all(&prefix).await?;
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "filesystem"
    }

    fn operator(&self) -> &Operator {
        &self.operator
    }
}
