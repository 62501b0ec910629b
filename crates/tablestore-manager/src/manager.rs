//! `StorageManager` — the orchestrator (SPEC_FULL §4.7). Composes the
//! engine registry, the schema cache/validator pipeline, the Iceberg
//! metadata writer, and the external `MetadataManager` collaborator into
//! the five public operations: `CreateTable`, `InsertData`, `GetTableData`,
//! `DropTable`, and the listing/existence pass-throughs.

use crate::metadata::MetadataManager;
use crate::statement::CreateTableStatement;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tablestore_core::error::{Result, TablestoreError};
use tablestore_core::types::{DataFile, DataFileType};
use tablestore_core::{PathManager, RequestContext};
use tablestore_engine::{EngineRegistry, FilesystemEngine, MemoryEngine, S3Engine, S3EngineConfig, StorageEngine};
use tablestore_iceberg::IcebergMetadataWriter;
use tablestore_schema::{validate_rows, SchemaCache, SchemaCacheConfig, ValidationSchema};

/// Rows are flushed to the engine in fixed-size sub-batches so peak memory
/// is bounded independent of the caller's batch size (spec.md §4.7 step 6).
const DEFAULT_SUB_BATCH_SIZE: usize = 1000;

/// The table's data always lives at one fixed path relative to the
/// engine's root (SPEC_FULL §4.2): the engine itself never sees Parquet,
/// only the Manager's line-delimited JSON bytes.
fn primary_data_path(database: &str, table: &str) -> String {
    format!("tables/{database}/{table}/data/primary.ndjson")
}

#[derive(Debug, Clone)]
pub struct StorageManagerConfig {
    pub data_path: std::path::PathBuf,
    pub engine_name: String,
    pub engine_version: String,
    pub schema_cache: SchemaCacheConfig,
    pub insert_sub_batch_size: usize,
    /// Credentials/config for the S3 engine variant. When `None` (or when
    /// `S3EngineConfig::from_env` fails), S3 is simply omitted from the
    /// registry — SPEC_FULL §4.2's "fails silently" requirement.
    pub s3: Option<S3EngineConfig>,
}

impl StorageManagerConfig {
    pub fn new(data_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            engine_name: "tablestore".to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_cache: SchemaCacheConfig::default(),
            insert_sub_batch_size: DEFAULT_SUB_BATCH_SIZE,
            s3: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableResponseMetadata {
    pub created_at: DateTime<Utc>,
    pub column_count: usize,
    pub engine: String,
    pub schema_version: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableResponse {
    pub table_id: i64,
    pub success: bool,
    pub metadata: CreateTableResponseMetadata,
}

/// The orchestrator. Exclusively owns the engine registry, schema cache,
/// and Iceberg writer (spec.md §3 "Ownership"); the metadata manager is
/// held by `Arc` and shared with whatever else the host process needs it
/// for. The manager never maintains its own view of table state — every
/// read of table existence/engine-tag/row-count goes through
/// `metadata` (spec.md §5 "single source of truth").
pub struct StorageManager {
    path_manager: PathManager,
    registry: EngineRegistry,
    schema_cache: SchemaCache,
    iceberg_writer: IcebergMetadataWriter,
    metadata: Arc<dyn MetadataManager>,
    sub_batch_size: usize,
}

impl StorageManager {
    /// Build the engine registry (Memory always; Filesystem and S3 best
    /// effort), the schema cache, and the Iceberg writer, then lay out the
    /// base directory tree. Fails only with a `config`-kind error if no
    /// engine ends up registered at all — which given Memory is infallible,
    /// should not happen in practice (spec.md §4.3).
    pub fn new(config: StorageManagerConfig, metadata: Arc<dyn MetadataManager>) -> Result<Self> {
        let path_manager = PathManager::new(&config.data_path);
        path_manager.ensure_directory_structure()?;

        let registry = EngineRegistry::new();
        registry.register(tablestore_engine::MEMORY, Arc::new(MemoryEngine::new()));

        match FilesystemEngine::new(&config.data_path) {
            Ok(engine) => registry.register(tablestore_engine::FILESYSTEM, Arc::new(engine)),
            Err(err) => {
                tracing::warn!(error = %err, "filesystem engine unavailable, continuing without it");
            }
        }

        let s3_config = config.s3.clone().or_else(|| S3EngineConfig::from_env().ok());
        if let Some(s3_config) = s3_config {
            match S3Engine::new(s3_config) {
                Ok(engine) => registry.register(tablestore_engine::S3, Arc::new(engine)),
                Err(err) => {
                    tracing::warn!(error = %err, "S3 engine unavailable, continuing without it");
                }
            }
        }

        registry.select_default()?;

        Ok(Self {
            path_manager,
            registry,
            schema_cache: SchemaCache::new(config.schema_cache),
            iceberg_writer: IcebergMetadataWriter::new(config.engine_name, config.engine_version),
            metadata,
            sub_batch_size: config.insert_sub_batch_size.max(1),
        })
    }

    pub fn path_manager(&self) -> &PathManager {
        &self.path_manager
    }

    pub fn engine_registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schema_cache
    }

    fn engine_for(&self, engine_name: &str) -> Result<Arc<dyn StorageEngine>> {
        self.registry.lookup(engine_name).ok_or_else(|| {
            TablestoreError::invalid_argument(format!("unknown storage engine: {engine_name}"))
                .with_context("engine", engine_name)
        })
    }

    /// spec.md §4.7 `CreateTable`, steps 1-7.
    pub async fn create_table(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
        statement: &CreateTableStatement,
        engine_name: &str,
    ) -> Result<CreateTableResponse> {
        ctx.check_deadline()?;

        // Step 1: shape/uniqueness/type-string validation.
        let columns = statement.validate_and_project()?;

        // Step 2: engine name against the registry.
        if !self.registry.exists(engine_name) {
            return Err(TablestoreError::invalid_argument(format!(
                "unsupported engine: {engine_name}"
            ))
            .with_context("engine", engine_name)
            .with_context("available_engines", self.registry.list().join(",")));
        }

        ctx.check_deadline()?;

        // Step 4: register the table row (step 3's projection already
        // happened above via `validate_and_project`).
        let table_id = self
            .metadata
            .create_table_with_schema(ctx, database, table, engine_name, columns.clone())
            .await?;

        // Step 5: ask the engine to materialize the table environment.
        let engine = self.engine_for(engine_name)?;
        engine.setup_table(database, table).await?;

        // Step 6: atomic Iceberg v1 metadata emission.
        ctx.check_deadline()?;
        let final_path = self.path_manager.table_metadata_file(database, table, 1);
        let location = self
            .path_manager
            .table_data_dir(database, table)
            .to_string_lossy()
            .into_owned();
        let table_uuid = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.iceberg_writer
            .write_v1(&final_path, table_uuid, location, now.timestamp_millis(), &columns)?;

        tracing::info!(
            request_id = %ctx.request_id,
            database,
            table,
            engine = engine_name,
            table_id,
            "created table"
        );

        Ok(CreateTableResponse {
            table_id,
            success: true,
            metadata: CreateTableResponseMetadata {
                created_at: now,
                column_count: columns.len(),
                engine: engine_name.to_string(),
                schema_version: 1,
            },
        })
    }

    /// Loader future for the schema cache on a miss (spec.md §4.4). Kept as
    /// a private helper rather than a stored closure: each call site builds
    /// its own ad-hoc future capturing `ctx`/`database`/`table` by value.
    async fn load_schema(
        metadata: Arc<dyn MetadataManager>,
        ctx: RequestContext,
        database: String,
        table: String,
    ) -> Result<tablestore_core::TableFormatSchema> {
        metadata.load_schema(&ctx, &database, &table).await
    }

    /// spec.md §4.7 `InsertData`, steps 1-8.
    pub async fn insert_data(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<()> {
        ctx.check_deadline()?;

        // Step 1: existence.
        if !self.metadata.table_exists(ctx, database, table).await? {
            return Err(TablestoreError::not_found(format!(
                "table {database}.{table} does not exist"
            ))
            .with_context("database", database)
            .with_context("table", table));
        }

        // Step 2: schema via the cache (single-flight loader on miss).
        let schema = self
            .schema_cache
            .get_or_load(
                database,
                table,
                Self::load_schema(
                    self.metadata.clone(),
                    ctx.clone(),
                    database.to_string(),
                    table.to_string(),
                ),
            )
            .await?;

        // Step 3: validate the whole batch, fail fast.
        let validation_schema = ValidationSchema::from_table_schema(&schema);
        validate_rows(database, table, &validation_schema, &rows)?;

        ctx.check_deadline()?;

        // Step 4: engine tag lookup.
        let record = self.metadata.load_table_metadata(ctx, database, table).await?;
        let engine = self.engine_for(&record.table.storage_engine)?;

        // Steps 5-6: sub-batch and write. Each `InsertData` call writes the
        // table's single primary object from scratch (spec.md §4.2's
        // FILESYSTEM/MEMORY "create-truncate" semantics) — concurrent
        // inserts on the same table are therefore last-writer-wins, a
        // documented limitation, not serialized here (spec.md §5, §9).
        let path = primary_data_path(database, table);
        let row_count = rows.len() as i64;
        let mut content = Vec::new();
        for chunk in rows.chunks(self.sub_batch_size) {
            ctx.check_deadline()?;
            serde_json::to_writer(&mut content, chunk)
                .map_err(|e| TablestoreError::infra(format!("row serialization failed: {e}")))?;
            content.push(b'\n');
        }

        let size_bytes = content.len() as u64;
        let checksum = hex::encode(blake3::hash(&content).as_bytes());

        // Step 7: write, rolling back the whole table environment on any
        // failure in this span.
        if let Err(write_err) = engine.write_file(&path, content).await {
            let _ = engine.remove_table_environment(database, table).await;
            return Err(write_err);
        }

        // Step 8: one atomic metadata update. Failure here is logged and
        // swallowed — the bytes are already durable (spec.md §4.7 step 8,
        // §9 open question on reconciliation).
        let file = DataFile {
            name: PathManager::parquet_file_name(Utc::now(), record.files.len() as u32),
            path: path.clone(),
            size_bytes,
            file_type: DataFileType::Parquet,
            row_count,
            checksum,
            compressed: false,
            partition_path: String::new(),
            created_at: Utc::now(),
        };
        if let Err(err) = self
            .metadata
            .update_table_after_insertion(ctx, database, table, file)
            .await
        {
            tracing::warn!(
                request_id = %ctx.request_id,
                database,
                table,
                error = %err,
                "metadata update after insertion failed; data file is durable but unrecorded"
            );
        }

        Ok(())
    }

    /// spec.md §4.7 `GetTableData`.
    pub async fn get_table_data(
        &self,
        ctx: &RequestContext,
        database: &str,
        table: &str,
    ) -> Result<Vec<Vec<Value>>> {
        ctx.check_deadline()?;

        if !self.metadata.table_exists(ctx, database, table).await? {
            return Err(TablestoreError::not_found(format!(
                "table {database}.{table} does not exist"
            ))
            .with_context("database", database)
            .with_context("table", table));
        }

        let record = self.metadata.load_table_metadata(ctx, database, table).await?;
        let engine = self.engine_for(&record.table.storage_engine)?;

        let path = primary_data_path(database, table);
        let bytes = engine.read_file(&path).await?;

        let mut rows = Vec::new();
        for line in bytes.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<Vec<Vec<Value>>>(line) {
                Ok(batch) => rows.extend(batch),
                Err(err) => {
                    tracing::warn!(
                        database,
                        table,
                        error = %err,
                        "skipping malformed line in table data"
                    );
                }
            }
        }
        Ok(rows)
    }

    /// spec.md §4.7 `DropTable`. Removes the catalog row before the storage
    /// environment; see DESIGN.md's Open Questions for the ordering
    /// rationale (spec.md §9).
    pub async fn drop_table(&self, ctx: &RequestContext, database: &str, table: &str) -> Result<()> {
        ctx.check_deadline()?;

        if !self.metadata.table_exists(ctx, database, table).await? {
            return Err(TablestoreError::not_found(format!(
                "table {database}.{table} does not exist"
            ))
            .with_context("database", database)
            .with_context("table", table));
        }

        let record = self.metadata.load_table_metadata(ctx, database, table).await?;
        let engine = self.engine_for(&record.table.storage_engine)?;

        // Metadata first: once the table is gone from the catalog it must
        // stay gone from ListTables/TableExists even if the engine-side
        // removal below fails (SPEC_FULL §9 open question 5 — an orphaned
        // engine object is preferable to a dangling metadata reference).
        self.metadata.drop_table(ctx, database, table).await?;
        engine.remove_table_environment(database, table).await
    }

    pub async fn list_tables(&self, ctx: &RequestContext, database: &str) -> Result<Vec<String>> {
        self.metadata.list_tables(ctx, database).await
    }

    pub async fn list_all_tables(&self, ctx: &RequestContext) -> Result<Vec<(String, String)>> {
        self.metadata.list_all_tables(ctx).await
    }

    pub async fn table_exists(&self, ctx: &RequestContext, database: &str, table: &str) -> Result<bool> {
        self.metadata.table_exists(ctx, database, table).await
    }

    pub async fn list_databases(&self, ctx: &RequestContext) -> Result<Vec<String>> {
        self.metadata.list_databases(ctx).await
    }

    pub async fn database_exists(&self, ctx: &RequestContext, database: &str) -> Result<bool> {
        self.metadata.database_exists(ctx, database).await
    }

    pub async fn create_database(&self, ctx: &RequestContext, database: &str) -> Result<()> {
        self.metadata.create_database(ctx, database).await
    }
}
