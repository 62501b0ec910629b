//! A test/reference `MetadataManager` implementation (SPEC_FULL §6 [ADD]).
//!
//! Not a production catalog — the real registry is the out-of-scope SQL
//! store described in spec.md §1. This exists so the crate's own
//! integration tests can drive the full `StorageManager` surface without a
//! database. State lives behind one `tokio::sync::RwLock`, which is fine
//! for tests but would serialize every metadata call under real load.

use crate::metadata::{MetadataManager, TableMetadataRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tablestore_core::error::{Result, TablestoreError};
use tablestore_core::types::{Column, DataFile, Database, Table, TableFormatSchema};
use tablestore_core::RequestContext;
use tokio::sync::RwLock;

struct TableState {
    table: Table,
    columns: Vec<Column>,
    files: Vec<DataFile>,
}

#[derive(Default)]
struct State {
    databases: HashMap<String, Database>,
    tables: HashMap<(String, String), TableState>,
    next_table_id: i64,
}

#[derive(Default)]
pub struct InMemoryMetadataManager {
    state: RwLock<State>,
}

impl InMemoryMetadataManager {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(database: &str, table: &str) -> TablestoreError {
    TablestoreError::not_found(format!("table {database}.{table} does not exist"))
        .with_context("database", database)
        .with_context("table", table)
}

#[async_trait]
impl MetadataManager for InMemoryMetadataManager {
    async fn table_exists(&self, _ctx: &RequestContext, database: &str, table: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .contains_key(&(database.to_string(), table.to_string())))
    }

    async fn load_table_metadata(
        &self,
        _ctx: &RequestContext,
        database: &str,
        table: &str,
    ) -> Result<TableMetadataRecord> {
        let state = self.state.read().await;
        let entry = state
            .tables
            .get(&(database.to_string(), table.to_string()))
            .ok_or_else(|| not_found(database, table))?;
        Ok(TableMetadataRecord {
            table: entry.table.clone(),
            files: entry.files.clone(),
        })
    }

    async fn create_table_with_schema(
        &self,
        _ctx: &RequestContext,
        database: &str,
        table: &str,
        storage_engine: &str,
        columns: Vec<Column>,
    ) -> Result<i64> {
        let mut state = self.state.write().await;
        let key = (database.to_string(), table.to_string());
        if state.tables.contains_key(&key) {
            return Err(TablestoreError::already_exists(format!(
                "table {database}.{table} already exists"
            ))
            .with_context("database", database)
            .with_context("table", table));
        }
        state
            .databases
            .entry(database.to_string())
            .or_insert_with(|| Database {
                name: database.to_string(),
                created_at: Utc::now(),
            });

        state.next_table_id += 1;
        let id = state.next_table_id;
        let now = Utc::now();
        let table_row = Table {
            id,
            database: database.to_string(),
            name: table.to_string(),
            storage_engine: storage_engine.to_string(),
            row_count: 0,
            file_count: 0,
            total_bytes: 0,
            created_at: now,
            updated_at: now,
        };
        state.tables.insert(
            key,
            TableState {
                table: table_row,
                columns,
                files: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn update_table_after_insertion(
        &self,
        _ctx: &RequestContext,
        database: &str,
        table: &str,
        file: DataFile,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .tables
            .get_mut(&(database.to_string(), table.to_string()))
            .ok_or_else(|| not_found(database, table))?;
        entry.table.row_count += file.row_count;
        entry.table.file_count += 1;
        entry.table.total_bytes += file.size_bytes as i64;
        entry.table.updated_at = Utc::now();
        entry.files.push(file);
        Ok(())
    }

    async fn list_tables(&self, _ctx: &RequestContext, database: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .tables
            .keys()
            .filter(|(db, _)| db == database)
            .map(|(_, t)| t.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_all_tables(&self, _ctx: &RequestContext) -> Result<Vec<(String, String)>> {
        let state = self.state.read().await;
        let mut all: Vec<(String, String)> = state.tables.keys().cloned().collect();
        all.sort();
        Ok(all)
    }

    async fn list_databases(&self, _ctx: &RequestContext) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state.databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn database_exists(&self, _ctx: &RequestContext, database: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.databases.contains_key(database))
    }

    async fn create_database(&self, _ctx: &RequestContext, database: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .databases
            .entry(database.to_string())
            .or_insert_with(|| Database {
                name: database.to_string(),
                created_at: Utc::now(),
            });
        Ok(())
    }

    async fn drop_table(&self, _ctx: &RequestContext, database: &str, table: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .tables
            .remove(&(database.to_string(), table.to_string()))
            .ok_or_else(|| not_found(database, table))?;
        Ok(())
    }

    async fn load_schema(
        &self,
        _ctx: &RequestContext,
        database: &str,
        table: &str,
    ) -> Result<TableFormatSchema> {
        let state = self.state.read().await;
        let entry = state
            .tables
            .get(&(database.to_string(), table.to_string()))
            .ok_or_else(|| not_found(database, table))?;
        Ok(entry.columns.clone())
    }

    async fn retrieve_all_schemas(
        &self,
        _ctx: &RequestContext,
    ) -> Result<Vec<((String, String), TableFormatSchema)>> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .iter()
            .map(|(key, entry)| (key.clone(), entry.columns.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestore_core::types::ColumnType;

    fn columns() -> Vec<Column> {
        vec![Column {
            ordinal: 1,
            name: "id".to_string(),
            column_type: ColumnType::Int64,
            nullable: false,
            default: None,
        }]
    }

    #[tokio::test]
    async fn create_then_exists() {
        let mgr = InMemoryMetadataManager::new();
        let ctx = RequestContext::new("r1");
        let id = mgr
            .create_table_with_schema(&ctx, "d", "t", "MEMORY", columns())
            .await
            .unwrap();
        assert_eq!(id, 1);
        assert!(mgr.table_exists(&ctx, "d", "t").await.unwrap());
        assert!(mgr.database_exists(&ctx, "d").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_create_is_already_exists() {
        let mgr = InMemoryMetadataManager::new();
        let ctx = RequestContext::new("r1");
        mgr.create_table_with_schema(&ctx, "d", "t", "MEMORY", columns())
            .await
            .unwrap();
        let err = mgr
            .create_table_with_schema(&ctx, "d", "t", "MEMORY", columns())
            .await
            .unwrap_err();
        assert_eq!(err.kind, tablestore_core::error::ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let mgr = InMemoryMetadataManager::new();
        let ctx = RequestContext::new("r1");
        let err = mgr.load_table_metadata(&ctx, "d", "ghost").await.unwrap_err();
        assert_eq!(err.kind, tablestore_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn insertion_bumps_counters() {
        let mgr = InMemoryMetadataManager::new();
        let ctx = RequestContext::new("r1");
        mgr.create_table_with_schema(&ctx, "d", "t", "MEMORY", columns())
            .await
            .unwrap();
        mgr.update_table_after_insertion(
            &ctx,
            "d",
            "t",
            DataFile {
                name: "data_20260101_000000_0000.parquet".to_string(),
                path: "tables/d/t/data/primary.ndjson".to_string(),
                size_bytes: 10,
                file_type: tablestore_core::types::DataFileType::Parquet,
                row_count: 2,
                checksum: "abc".to_string(),
                compressed: false,
                partition_path: String::new(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        let record = mgr.load_table_metadata(&ctx, "d", "t").await.unwrap();
        assert_eq!(record.table.row_count, 2);
        assert_eq!(record.table.file_count, 1);
        assert_eq!(record.files.len(), 1);
    }
}
