//! `(database, table)` -> schema cache with TTL, optional LRU, and
//! single-flight population (SPEC_FULL §4.4). Backed by
//! `moka::future::Cache`, which is lock-free on the read path and collapses
//! concurrent misses on the same key into one loader invocation natively —
//! no extra mutex is layered on top (SPEC_FULL §5).

use moka::future::Cache;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tablestore_core::error::{ErrorKind, Result, TablestoreError};
use tablestore_core::TableFormatSchema;

type CacheKey = (String, String);

#[derive(Debug, Default)]
pub struct SchemaCacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    last_updated_unix_ms: AtomicU64,
}

impl SchemaCacheMetrics {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn last_updated_unix_ms(&self) -> u64 {
        self.last_updated_unix_ms.load(Ordering::Relaxed)
    }

    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.last_updated_unix_ms.store(now_unix_ms(), Ordering::Relaxed);
    }
}

fn now_unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaCacheConfig {
    pub ttl_minutes: u64,
    pub enable_lru: bool,
    pub max_cache_size: u64,
    /// Gate for the periodic stats emission in `SchemaCache::maybe_emit_stats`
    /// (SPEC_FULL §4.4's "optional periodic stats emission").
    pub enable_metrics: bool,
    /// Minimum spacing, in seconds, between two `tracing::info!` stats
    /// emissions. Only consulted when `enable_metrics` is set.
    pub stats_interval_secs: u64,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            enable_lru: false,
            max_cache_size: 10_000,
            enable_metrics: false,
            stats_interval_secs: 60,
        }
    }
}

pub struct SchemaCache {
    cache: Cache<CacheKey, Arc<TableFormatSchema>>,
    metrics: Arc<SchemaCacheMetrics>,
    enable_metrics: bool,
    stats_interval_secs: u64,
    last_stats_emit_unix_ms: AtomicU64,
}

impl SchemaCache {
    pub fn new(config: SchemaCacheConfig) -> Self {
        let mut builder =
            Cache::builder().time_to_live(Duration::from_secs(config.ttl_minutes * 60));
        if config.enable_lru {
            builder = builder.max_capacity(config.max_cache_size);
        }
        let metrics = Arc::new(SchemaCacheMetrics::default());
        let eviction_metrics = metrics.clone();
        let cache = builder
            .eviction_listener(move |_key, _value, _cause| {
                eviction_metrics.evictions.fetch_add(1, Ordering::Relaxed);
            })
            .build();
        Self {
            cache,
            metrics,
            enable_metrics: config.enable_metrics,
            stats_interval_secs: config.stats_interval_secs,
            last_stats_emit_unix_ms: AtomicU64::new(0),
        }
    }

    pub fn metrics(&self) -> &SchemaCacheMetrics {
        &self.metrics
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Fetch the cached schema for `(database, table)`, running `loader` on
    /// a miss. Concurrent callers racing on the same missing key share the
    /// one `loader` invocation that wins (moka's `try_get_with`); the hit/miss
    /// counters are driven by whether this call's `loader` was the one that
    /// actually ran, not by a pre-check against the cache, so they stay
    /// accurate when several callers race on the same missing key.
    pub async fn get_or_load<F>(
        &self,
        database: &str,
        table: &str,
        loader: F,
    ) -> Result<Arc<TableFormatSchema>>
    where
        F: Future<Output = Result<TableFormatSchema>>,
    {
        let key = (database.to_string(), table.to_string());
        let loader_ran = Arc::new(AtomicBool::new(false));
        let loader_ran_flag = loader_ran.clone();
        let result = self
            .cache
            .try_get_with(key, async move {
                loader_ran_flag.store(true, Ordering::SeqCst);
                loader.await.map(Arc::new)
            })
            .await;
        if loader_ran.load(Ordering::SeqCst) {
            self.metrics.record_miss();
        } else {
            self.metrics.record_hit();
        }
        self.maybe_emit_stats();
        result.map_err(|e: Arc<TablestoreError>| {
            TablestoreError::new(e.kind, e.message.clone()).with_context("cache", "miss-load-failed")
        })
    }

    /// Logs the current hit/miss/eviction counters via `tracing::info!` if
    /// `enable_metrics` is set and at least `stats_interval_secs` have
    /// elapsed since the last emission. A no-op otherwise.
    fn maybe_emit_stats(&self) {
        if !self.enable_metrics {
            return;
        }
        let now = now_unix_ms();
        let last = self.last_stats_emit_unix_ms.load(Ordering::Relaxed);
        let interval_ms = self.stats_interval_secs.saturating_mul(1000);
        if now.saturating_sub(last) < interval_ms {
            return;
        }
        if self
            .last_stats_emit_unix_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        tracing::info!(
            hits = self.metrics.hits(),
            misses = self.metrics.misses(),
            evictions = self.metrics.evictions(),
            hit_ratio = self.metrics.hit_ratio(),
            entry_count = self.cache.entry_count(),
            "schema cache stats"
        );
    }

    /// Explicit invalidation on schema change (SPEC_FULL §4.4).
    pub fn invalidate(&self, database: &str, table: &str) {
        self.cache
            .invalidate(&(database.to_string(), table.to_string()));
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

pub(crate) fn not_found(database: &str, table: &str) -> TablestoreError {
    TablestoreError::new(
        ErrorKind::NotFound,
        format!("no schema for {database}.{table}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestore_core::types::{Column, ColumnType};

    fn test_schema() -> TableFormatSchema {
        vec![Column {
            ordinal: 1,
            name: "id".to_string(),
            column_type: ColumnType::Int64,
            nullable: false,
            default: None,
        }]
    }

    #[tokio::test]
    async fn miss_then_hit_counts_correctly() {
        let cache = SchemaCache::new(SchemaCacheConfig::default());
        let schema = cache
            .get_or_load("sales", "orders", async { Ok(test_schema()) })
            .await
            .unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(cache.metrics().misses(), 1);
        assert_eq!(cache.metrics().hits(), 0);

        cache
            .get_or_load("sales", "orders", async { Ok(test_schema()) })
            .await
            .unwrap();
        assert_eq!(cache.metrics().hits(), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_single_flight() {
        let cache = Arc::new(SchemaCache::new(SchemaCacheConfig::default()));
        let counter = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load("sales", "orders", async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(test_schema())
                    })
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = SchemaCache::new(SchemaCacheConfig::default());
        cache
            .get_or_load("sales", "orders", async { Ok(test_schema()) })
            .await
            .unwrap();
        cache.invalidate("sales", "orders");
        cache
            .get_or_load("sales", "orders", async { Ok(test_schema()) })
            .await
            .unwrap();
        assert_eq!(cache.metrics().misses(), 2);
    }

    #[tokio::test]
    async fn loader_error_propagates() {
        let cache = SchemaCache::new(SchemaCacheConfig::default());
        let err = cache
            .get_or_load("sales", "ghost", async {
                Err(not_found("sales", "ghost"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
