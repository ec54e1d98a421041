//! Error types for mapping operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing a mapping
#[derive(Error, Debug)]
pub enum MappingError {
    /// Failed to read a destination catalog file
    #[error("Failed to read catalog file: {path}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a destination catalog
    #[error("Failed to parse catalog: {0}")]
    CatalogParse(String),
}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;
