//! Error types for payload building

use std::path::PathBuf;
use thiserror::Error;

/// Errors that fail a single payload row or a configuration load
#[derive(Error, Debug)]
pub enum BuildError {
    /// The built payload lacks required destination fields
    #[error("Missing required fields for {table}: {}", fields.join(", "))]
    MissingRequiredFields { table: String, fields: Vec<String> },

    /// A reference value has no entry in the id mapping table
    #[error("No id mapping for {value} in {id_table}")]
    UnmappedReference { id_table: String, value: String },

    /// Failed to read a payload configuration file
    #[error("Failed to read payload config: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a payload configuration
    #[error("Failed to parse payload config: {0}")]
    ConfigParse(String),
}

/// Result type for payload building
pub type BuildResult<T> = Result<T, BuildError>;

/// Failure inside a transformer; always recovered by the field builder
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{transformer} cannot convert {value}: {reason}")]
pub struct TransformError {
    pub transformer: String,
    pub value: String,
    pub reason: String,
}

impl TransformError {
    pub fn new(
        transformer: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            transformer: transformer.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
