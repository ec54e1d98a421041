//! Export functionality
//!
//! Writes a migration manifest: the extracted source schema, the mapping
//! rules and summary metadata, as one JSON document.

pub mod manifest;

pub use manifest::{ManifestMetadata, MigrationManifest};

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
