//! Migration manifest

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExportError, ExportResult};
use crate::models::{MappingRule, SourceSchema};
use crate::validation::ValidationReport;

/// Summary block of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub created_at: DateTime<Utc>,
    pub source_database: String,
    pub source_tables: usize,
    pub total_records: u64,
    /// `PENDING` until a validation report is attached
    pub validation_result: String,
}

/// Source schema and mapping rules of one migration, with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationManifest {
    pub metadata: ManifestMetadata,
    pub schema: SourceSchema,
    pub mappings: Vec<MappingRule>,
}

impl MigrationManifest {
    pub fn new(schema: SourceSchema, mappings: Vec<MappingRule>) -> Self {
        let metadata = ManifestMetadata {
            created_at: Utc::now(),
            source_database: schema.database_type.clone(),
            source_tables: schema.tables.len(),
            total_records: schema.total_estimated_rows,
            validation_result: "PENDING".to_string(),
        };
        Self {
            metadata,
            schema,
            mappings,
        }
    }

    /// Record the outcome of a validation run
    pub fn with_validation(mut self, report: &ValidationReport) -> Self {
        self.metadata.validation_result = report.status().to_string();
        self
    }

    pub fn to_json(&self) -> ExportResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ExportError::SerializationError(e.to_string()))
    }

    /// Write pretty JSON, creating parent directories
    pub fn write_json(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::IoError(e.to_string()))?;
        }
        std::fs::write(path, self.to_json()?).map_err(|e| ExportError::IoError(e.to_string()))?;
        tracing::info!("Wrote migration manifest to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceTable;
    use crate::validation::validate_mappings;
    use tempfile::TempDir;

    #[test]
    fn test_metadata_from_schema() {
        let mut schema = SourceSchema::new("postgresql");
        schema.tables.push(SourceTable::new("a").with_estimated_rows(3));
        schema.tables.push(SourceTable::new("b").with_estimated_rows(4));
        schema.recompute_totals();

        let manifest = MigrationManifest::new(schema, Vec::new());
        assert_eq!(manifest.metadata.source_database, "postgresql");
        assert_eq!(manifest.metadata.source_tables, 2);
        assert_eq!(manifest.metadata.total_records, 7);
        assert_eq!(manifest.metadata.validation_result, "PENDING");
    }

    #[test]
    fn test_write_json_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/manifest.json");
        let schema = SourceSchema::new("csv");
        let report = validate_mappings(&schema, &[]);

        MigrationManifest::new(schema, Vec::new())
            .with_validation(&report)
            .write_json(&path)
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["validation_result"], "PASSED");
        assert!(written["mappings"].as_array().unwrap().is_empty());
    }
}
