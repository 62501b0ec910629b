//! Concurrent-safe `name -> engine` map with a single default engine
//! (SPEC_FULL §4.3). Registration happens once at startup; lookups are
//! read-lock only so many concurrent callers never block each other.

use crate::contract::StorageEngine;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tablestore_core::error::{Result, TablestoreError};

pub const MEMORY: &str = "MEMORY";
pub const FILESYSTEM: &str = "FILESYSTEM";
pub const S3: &str = "S3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub name: String,
    pub storage_type: &'static str,
    pub is_default: bool,
}

pub struct EngineRegistry {
    engines: RwLock<HashMap<String, Arc<dyn StorageEngine>>>,
    default_engine: RwLock<Option<String>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
            default_engine: RwLock::new(None),
        }
    }

    pub fn register(&self, name: impl Into<String>, engine: Arc<dyn StorageEngine>) {
        let name = name.into();
        self.engines.write().insert(name, engine);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn StorageEngine>> {
        self.engines.read().get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.engines.read().contains_key(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn status(&self) -> Vec<EngineStatus> {
        let default = self.default_engine.read().clone();
        let engines = self.engines.read();
        let mut statuses: Vec<EngineStatus> = engines
            .iter()
            .map(|(name, engine)| EngineStatus {
                name: name.clone(),
                storage_type: engine.storage_type(),
                is_default: Some(name.as_str()) == default.as_deref(),
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    pub fn default_engine_name(&self) -> Option<String> {
        self.default_engine.read().clone()
    }

    pub fn default_engine(&self) -> Result<Arc<dyn StorageEngine>> {
        let name = self
            .default_engine_name()
            .ok_or_else(|| TablestoreError::config("no-engines-available"))?;
        self.lookup(&name)
            .ok_or_else(|| TablestoreError::config("no-engines-available"))
    }

    /// Pick the default: prefer `FILESYSTEM`, fall back to `MEMORY`, and
    /// error with *no-engines-available* if neither is registered. Called
    /// once during startup after all engines have been registered.
    pub fn select_default(&self) -> Result<()> {
        let engines = self.engines.read();
        let chosen = if engines.contains_key(FILESYSTEM) {
            FILESYSTEM
        } else if engines.contains_key(MEMORY) {
            MEMORY
        } else {
            return Err(TablestoreError::config("no-engines-available"));
        };
        drop(engines);
        *self.default_engine.write() = Some(chosen.to_string());
        Ok(())
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
