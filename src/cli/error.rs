//! CLI error types

use std::path::PathBuf;

/// Errors reported by CLI commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),
    #[error("Failed to write {0}: {1}")]
    FileWriteError(PathBuf, String),
    #[error(transparent)]
    Config(#[from] erp_migration_sdk::ConfigError),
    #[error(transparent)]
    Import(#[from] erp_migration_sdk::ImportError),
    #[error(transparent)]
    Introspection(#[from] erp_migration_sdk::IntrospectionError),
    #[error(transparent)]
    Mapping(#[from] erp_migration_sdk::MappingError),
    #[error(transparent)]
    Build(#[from] erp_migration_sdk::BuildError),
    #[error(transparent)]
    Export(#[from] erp_migration_sdk::ExportError),
}
