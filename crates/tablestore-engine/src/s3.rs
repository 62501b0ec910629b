//! S3-compatible object storage engine backed by `opendal::services::S3`
//! (SPEC_FULL §4.2). Construction fails, rather than panics, when the
//! required credentials/config are absent so the registry can omit S3 from
//! the default set instead of crashing on startup.

use crate::contract::StorageEngine;
use async_trait::async_trait;
use futures_util::StreamExt;
use opendal::{services, Operator};
use tablestore_core::error::{Result, TablestoreError};

#[derive(Debug, Clone)]
pub struct S3EngineConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3EngineConfig {
    /// Build config from environment variables commonly set for S3-compatible
    /// backends: `TABLESTORE_S3_BUCKET`, `TABLESTORE_S3_REGION`, and
    /// optionally `TABLESTORE_S3_ENDPOINT` / `AWS_ACCESS_KEY_ID` /
    /// `AWS_SECRET_ACCESS_KEY`.
    pub fn from_env() -> Result<Self> {
        let bucket = std::env::var("TABLESTORE_S3_BUCKET").map_err(|_| {
            TablestoreError::config("TABLESTORE_S3_BUCKET is not set; S3 engine unavailable")
        })?;
        let region = std::env::var("TABLESTORE_S3_REGION").unwrap_or_else(|_| "us-east-1".into());
        Ok(Self {
            bucket,
            region,
            endpoint: std::env::var("TABLESTORE_S3_ENDPOINT").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        })
    }
}

pub struct S3Engine {
    operator: Operator,
}

impl S3Engine {
    pub fn new(config: S3EngineConfig) -> Result<Self> {
        let mut builder = services::S3::default()
            .bucket(&config.bucket)
            .region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder.access_key_id(key).secret_access_key(secret);
        }

        let operator = Operator::new(builder)
            .map_err(|e| TablestoreError::config(format!("invalid S3 configuration: {e}")))?
            .finish();
        Ok(Self { operator })
    }
}

#[async_trait]
impl StorageEngine for S3Engine {
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
        // Object stores have no directories to pre-create; the first write
        // under a table's key prefix brings it into existence.
        Ok(())
    }

    async fn remove_table_environment(&self, database: &str, table: &str) -> Result<()> {
        let prefix = format!("tables/{database}/{table}/");
        self.operator.remove_all(&prefix).await?;
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "s3"
    }

    fn operator(&self) -> &Operator {
        &self.operator
    }
}
