// Layered configuration loading (SPEC_FULL §6 [ADD]).
//
// Sources, lowest to highest priority:
// 1. Compiled-in defaults
// 2. A YAML file named by the TABLESTORE_CONFIG env var
// 3. Individual TABLESTORE_* env var overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tablestore_core::path::CatalogType;
use tablestore_manager::StorageManagerConfig;
use tablestore_schema::SchemaCacheConfig;

const ENV_PREFIX: &str = "TABLESTORE_";

/// Top-level configuration for a `StorageManager` instance and its ambient
/// logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablestoreConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub schema_cache: SchemaCacheSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    pub data_path: PathBuf,
    pub catalog_type: CatalogTypeConfig,
    pub insert_sub_batch_size: usize,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data"),
            catalog_type: CatalogTypeConfig::Json,
            insert_sub_batch_size: 1000,
        }
    }
}

/// Serde-friendly mirror of `tablestore_core::path::CatalogType`. The catalog
/// itself lives outside this crate (spec.md §1's out-of-scope SQL registry);
/// this only tells `PathManager::catalog_uri` which layout to assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogTypeConfig {
    Json,
    Sqlite,
    Rest,
}

impl From<CatalogTypeConfig> for CatalogType {
    fn from(value: CatalogTypeConfig) -> Self {
        match value {
            CatalogTypeConfig::Json => CatalogType::Json,
            CatalogTypeConfig::Sqlite => CatalogType::Sqlite,
            CatalogTypeConfig::Rest => CatalogType::Rest,
        }
    }
}

impl std::str::FromStr for CatalogTypeConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(CatalogTypeConfig::Json),
            "sqlite" => Ok(CatalogTypeConfig::Sqlite),
            "rest" => Ok(CatalogTypeConfig::Rest),
            other => anyhow::bail!("unsupported catalog type: {other}. supported: json, sqlite, rest"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCacheSection {
    pub ttl_minutes: u64,
    pub max_cache_size: u64,
    pub enable_lru: bool,
    pub enable_metrics: bool,
    pub stats_interval_secs: u64,
}

impl Default for SchemaCacheSection {
    fn default() -> Self {
        let defaults = SchemaCacheConfig::default();
        Self {
            ttl_minutes: defaults.ttl_minutes,
            max_cache_size: defaults.max_cache_size,
            enable_lru: defaults.enable_lru,
            enable_metrics: defaults.enable_metrics,
            stats_interval_secs: defaults.stats_interval_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for TablestoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageSection::default(),
            schema_cache: SchemaCacheSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl TablestoreConfig {
    /// Load configuration from all sources with priority.
    pub fn load() -> Result<Self> {
        let mut config = load_from_file()?.unwrap_or_default();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Project this configuration onto the `StorageManagerConfig` the
    /// manager crate expects, filling in the S3 engine's own env-var
    /// resolution (`S3EngineConfig::from_env`) rather than duplicating it.
    pub fn storage_manager_config(&self) -> StorageManagerConfig {
        let mut manager_config = StorageManagerConfig::new(self.storage.data_path.clone());
        manager_config.insert_sub_batch_size = self.storage.insert_sub_batch_size;
        manager_config.schema_cache = SchemaCacheConfig {
            ttl_minutes: self.schema_cache.ttl_minutes,
            max_cache_size: self.schema_cache.max_cache_size,
            enable_lru: self.schema_cache.enable_lru,
            enable_metrics: self.schema_cache.enable_metrics,
            stats_interval_secs: self.schema_cache.stats_interval_secs,
        };
        manager_config
    }

    pub fn catalog_type(&self) -> CatalogType {
        self.storage.catalog_type.into()
    }
}

fn load_from_file() -> Result<Option<TablestoreConfig>> {
    let path = match env::var("TABLESTORE_CONFIG") {
        Ok(path) => path,
        Err(_) => return Ok(None),
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file: {path}"))?;
    let config: TablestoreConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {path}"))?;
    Ok(Some(config))
}

fn apply_env_overrides(config: &mut TablestoreConfig) -> Result<()> {
    if let Some(value) = get_env_string("DATA_PATH") {
        config.storage.data_path = PathBuf::from(value);
    }
    if let Some(value) = get_env_string("CATALOG_TYPE") {
        config.storage.catalog_type = value
            .parse()
            .context("invalid TABLESTORE_CATALOG_TYPE value")?;
    }
    if let Some(value) = get_env_usize("INSERT_SUB_BATCH_SIZE")? {
        config.storage.insert_sub_batch_size = value;
    }
    if let Some(value) = get_env_u64("SCHEMA_CACHE_TTL_MINUTES")? {
        config.schema_cache.ttl_minutes = value;
    }
    if let Some(value) = get_env_u64("SCHEMA_CACHE_MAX_SIZE")? {
        config.schema_cache.max_cache_size = value;
    }
    if let Some(value) = get_env_bool("SCHEMA_CACHE_ENABLE_LRU")? {
        config.schema_cache.enable_lru = value;
    }
    if let Some(value) = get_env_bool("SCHEMA_CACHE_ENABLE_METRICS")? {
        config.schema_cache.enable_metrics = value;
    }
    if let Some(value) = get_env_u64("SCHEMA_CACHE_STATS_INTERVAL_SECS")? {
        config.schema_cache.stats_interval_secs = value;
    }
    if let Some(value) = get_env_string("LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Some(value) = get_env_bool("LOG_JSON")? {
        config.logging.json = value;
    }
    Ok(())
}

fn get_env_string(key: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{key}"))
        .ok()
        .filter(|v| !v.is_empty())
}

fn get_env_usize(key: &str) -> Result<Option<usize>> {
    match get_env_string(key) {
        Some(value) => Ok(Some(value.parse().with_context(|| {
            format!("{ENV_PREFIX}{key} must be a valid number")
        })?)),
        None => Ok(None),
    }
}

fn get_env_u64(key: &str) -> Result<Option<u64>> {
    match get_env_string(key) {
        Some(value) => Ok(Some(value.parse().with_context(|| {
            format!("{ENV_PREFIX}{key} must be a valid number")
        })?)),
        None => Ok(None),
    }
}

fn get_env_bool(key: &str) -> Result<Option<bool>> {
    match get_env_string(key) {
        Some(value) => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => anyhow::bail!("{ENV_PREFIX}{key} must be true or false"),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = TablestoreConfig::default();
        assert_eq!(config.storage.catalog_type, CatalogTypeConfig::Json);
        assert_eq!(config.schema_cache.ttl_minutes, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn catalog_type_parses_case_insensitively() {
        assert_eq!("JSON".parse::<CatalogTypeConfig>().unwrap(), CatalogTypeConfig::Json);
        assert_eq!("sqlite".parse::<CatalogTypeConfig>().unwrap(), CatalogTypeConfig::Sqlite);
        assert!("bogus".parse::<CatalogTypeConfig>().is_err());
    }

    #[test]
    fn env_overrides_take_priority_over_defaults() {
        std::env::set_var("TABLESTORE_DATA_PATH", "/tmp/tablestore-test-data");
        std::env::set_var("TABLESTORE_SCHEMA_CACHE_TTL_MINUTES", "5");
        let mut config = TablestoreConfig::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.storage.data_path, PathBuf::from("/tmp/tablestore-test-data"));
        assert_eq!(config.schema_cache.ttl_minutes, 5);
        std::env::remove_var("TABLESTORE_DATA_PATH");
        std::env::remove_var("TABLESTORE_SCHEMA_CACHE_TTL_MINUTES");
    }

    #[test]
    fn storage_manager_config_projects_schema_cache_settings() {
        let mut config = TablestoreConfig::default();
        config.schema_cache.ttl_minutes = 7;
        config.storage.insert_sub_batch_size = 42;
        let manager_config = config.storage_manager_config();
        assert_eq!(manager_config.schema_cache.ttl_minutes, 7);
        assert_eq!(manager_config.insert_sub_batch_size, 42);
    }
}
