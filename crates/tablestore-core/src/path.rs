//! Pure path layout for the on-disk/on-object-store tree described in
//! SPEC_FULL §6. `PathManager` holds nothing but a base path; every
//! accessor is a deterministic function of `self` and its arguments
//! (Testable Property 1 — no global state, no I/O).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathManager {
    base: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogType {
    Json,
    Sqlite,
    Rest,
}

impl PathManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.base.join("catalog")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base.join("data")
    }

    pub fn internal_metadata_dir(&self) -> PathBuf {
        self.base.join(".meta")
    }

    pub fn internal_metadata_db(&self) -> PathBuf {
        self.internal_metadata_dir().join("metadata.db")
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.internal_metadata_dir().join("migrations")
    }

    /// `{base}/catalog/catalog.json` or `{base}/catalog/catalog.db`,
    /// depending on the configured catalog backend. `Rest` has no
    /// filesystem-local URI — the catalog address comes from configuration
    /// instead, so this returns `None` for that variant.
    pub fn catalog_uri(&self, catalog_type: CatalogType) -> Option<PathBuf> {
        match catalog_type {
            CatalogType::Json => Some(self.catalog_dir().join("catalog.json")),
            CatalogType::Sqlite => Some(self.catalog_dir().join("catalog.db")),
            CatalogType::Rest => None,
        }
    }

    fn table_root(&self, database: &str, table: &str) -> PathBuf {
        self.base.join("tables").join(database).join(table)
    }

    pub fn table_data_dir(&self, database: &str, table: &str) -> PathBuf {
        self.table_root(database, table).join("data")
    }

    pub fn table_metadata_dir(&self, database: &str, table: &str) -> PathBuf {
        self.table_root(database, table).join("metadata")
    }

    pub fn table_manifests_dir(&self, database: &str, table: &str) -> PathBuf {
        self.table_root(database, table).join("manifests")
    }

    /// `{base}/tables/{db}/{table}/metadata/v{N}.metadata.json`
    pub fn table_metadata_file(&self, database: &str, table: &str, version: u64) -> PathBuf {
        self.table_metadata_dir(database, table)
            .join(format!("v{version}.metadata.json"))
    }

    /// `data_{YYYYMMDD_HHMMSS}_{counter:04}.parquet`
    pub fn parquet_file_name(timestamp: chrono::DateTime<chrono::Utc>, counter: u32) -> String {
        format!(
            "data_{}_{counter:04}.parquet",
            timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Create `base`, `catalog`, `data`, `.meta`, and `.meta/migrations` if
    /// absent. Idempotent: safe to call on every Manager startup.
    pub fn ensure_directory_structure(&self) -> std::io::Result<()> {
        for dir in [
            self.base.clone(),
            self.catalog_dir(),
            self.data_dir(),
            self.internal_metadata_dir(),
            self.migrations_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_pure_functions_of_inputs() {
        let pm = PathManager::new("/srv/lakehouse");
        assert_eq!(
            pm.table_metadata_file("sales", "orders", 1),
            PathBuf::from("/srv/lakehouse/tables/sales/orders/metadata/v1.metadata.json")
        );
        // calling again with the same inputs yields the same output
        assert_eq!(
            pm.table_metadata_file("sales", "orders", 1),
            pm.table_metadata_file("sales", "orders", 1)
        );
    }

    #[test]
    fn catalog_uri_by_type() {
        let pm = PathManager::new("/base");
        assert_eq!(
            pm.catalog_uri(CatalogType::Json),
            Some(PathBuf::from("/base/catalog/catalog.json"))
        );
        assert_eq!(
            pm.catalog_uri(CatalogType::Sqlite),
            Some(PathBuf::from("/base/catalog/catalog.db"))
        );
        assert_eq!(pm.catalog_uri(CatalogType::Rest), None);
    }

    #[test]
    fn ensure_directory_structure_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let pm = PathManager::new(tmp.path());
        pm.ensure_directory_structure().unwrap();
        pm.ensure_directory_structure().unwrap();
        assert!(pm.catalog_dir().is_dir());
        assert!(pm.data_dir().is_dir());
        assert!(pm.migrations_dir().is_dir());
    }

    #[test]
    fn parquet_file_name_format() {
        let ts = chrono::DateTime::parse_from_rfc3339("2026-07-28T10:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(
            PathManager::parquet_file_name(ts, 7),
            "data_20260728_103000_0007.parquet"
        );
    }
}
