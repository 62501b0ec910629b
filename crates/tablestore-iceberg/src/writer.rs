//! Atomic write of `v1.metadata.json` (SPEC_FULL §4.6). Serializes the
//! document to a sibling temp file, syncs it, then renames over the final
//! path — the only supported atomicity mechanism (SPEC_FULL §9: "direct
//! overwrite is forbidden because partial writes on crash would leave
//! unreadable JSON").

use crate::types::TableMetadata;
use std::path::Path;
use tablestore_core::error::{Result, TablestoreError};
use tablestore_core::types::Column;

pub struct IcebergMetadataWriter {
    engine_name: String,
    engine_version: String,
}

impl IcebergMetadataWriter {
    pub fn new(engine_name: impl Into<String>, engine_version: impl Into<String>) -> Self {
        Self {
            engine_name: engine_name.into(),
            engine_version: engine_version.into(),
        }
    }

    /// Build the v1 document and write it atomically to `final_path`. The
    /// temp file is created in `final_path`'s own parent directory so the
    /// later rename stays on the same filesystem (required for atomicity).
    pub fn write_v1(
        &self,
        final_path: &Path,
        table_uuid: String,
        location: String,
        now_ms: i64,
        columns: &[Column],
    ) -> Result<TableMetadata> {
        let metadata = TableMetadata::new_v1(
            table_uuid,
            location,
            now_ms,
            columns,
            &self.engine_name,
            &self.engine_version,
        );

        let parent = final_path.parent().ok_or_else(|| {
            TablestoreError::config(format!(
                "metadata path has no parent directory: {}",
                final_path.display()
            ))
        })?;
        std::fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut temp_file, &metadata)?;
        temp_file.as_file().sync_all()?;

        // `persist` performs the rename; on any earlier error `temp_file`'s
        // `Drop` unlinks the partially-written file, so no stray temp file
        // or partial final file can be observed afterward.
        temp_file
            .persist(final_path)
            .map_err(|e| TablestoreError::infra(e.to_string()))?;

        tracing::info!(
            path = %final_path.display(),
            table_uuid = %metadata.table_uuid,
            "wrote iceberg v1 metadata"
        );

        Ok(metadata)
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

    #[test]
    fn writes_valid_json_at_final_path() {
        let tmp = tempfile::tempdir().unwrap();
        let final_path = tmp.path().join("metadata").join("v1.metadata.json");
        let writer = IcebergMetadataWriter::new("tablestore", "0.2.0");
        let metadata = writer
            .write_v1(&final_path, "uuid-1".to_string(), "/data".to_string(), 0, &columns())
            .unwrap();

        assert!(final_path.exists());
        let contents = std::fs::read_to_string(&final_path).unwrap();
        let parsed: TableMetadata = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn no_temp_file_survives_a_successful_write() {
        let tmp = tempfile::tempdir().unwrap();
        let final_path = tmp.path().join("metadata").join("v1.metadata.json");
        let writer = IcebergMetadataWriter::new("tablestore", "0.2.0");
        writer
            .write_v1(&final_path, "uuid-1".to_string(), "/data".to_string(), 0, &columns())
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(final_path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![final_path.file_name().unwrap().to_os_string()]);
    }
}
