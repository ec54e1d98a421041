//! Import functionality
//!
//! Provides parsers that extract a [`SourceSchema`] from legacy backups:
//! - SQL dumps (CREATE TABLE statements, several dialects)
//! - CSV / TSV text with delimiter auto-detection
//! - Excel workbooks (one table per worksheet)
//! - Access databases exported as workbooks
//!
//! Every format implements [`BackupParser`]; [`create_parser`] picks one from
//! a file extension and [`parse_backup`] reads and parses a file in one call.

pub mod access;
pub mod csv;
pub mod dialect;
pub mod excel;
pub mod sql;
pub mod tabular;
#[cfg(feature = "excel")]
pub mod workbook;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::SourceSchema;

pub use self::access::AccessParser;
pub use self::csv::CsvParser;
pub use self::dialect::{DialectDetector, SqlDialect, detect_dialect_from_file};
pub use self::excel::ExcelParser;
pub use self::sql::SqlParser;
pub use self::tabular::Sheet;

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported backup format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to read backup file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Workbook error: {0}")]
    Workbook(String),
    #[error("Feature '{0}' is not enabled in this build")]
    FeatureDisabled(&'static str),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Backup container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupFormat {
    Sql,
    Csv,
    Excel,
    Access,
}

impl BackupFormat {
    /// Format for a file extension (case-insensitive, leading dot optional)
    pub fn from_extension(ext: &str) -> ImportResult<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "sql" | "dump" | "bak" => Ok(BackupFormat::Sql),
            "csv" | "tsv" | "txt" => Ok(BackupFormat::Csv),
            "xlsx" | "xlsm" | "xls" => Ok(BackupFormat::Excel),
            "mdb" | "accdb" => Ok(BackupFormat::Access),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Format for a file path, by extension
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ImportError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(ext)
    }
}

impl std::fmt::Display for BackupFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupFormat::Sql => write!(f, "sql"),
            BackupFormat::Csv => write!(f, "csv"),
            BackupFormat::Excel => write!(f, "excel"),
            BackupFormat::Access => write!(f, "access"),
        }
    }
}

/// Extracts a source schema from the raw bytes of one backup artifact
pub trait BackupParser {
    /// Parse `content`, keeping only `selected_tables` when given
    /// (case-insensitive)
    fn parse(
        &self,
        content: &[u8],
        selected_tables: Option<&[String]>,
    ) -> ImportResult<SourceSchema>;

    fn format(&self) -> BackupFormat;
}

/// Parser for a backup format
pub fn parser_for(format: BackupFormat) -> Box<dyn BackupParser> {
    match format {
        BackupFormat::Sql => Box::new(SqlParser::new()),
        BackupFormat::Csv => Box::new(CsvParser::new()),
        BackupFormat::Excel => Box::new(ExcelParser::new()),
        BackupFormat::Access => Box::new(AccessParser::new()),
    }
}

/// Parser for a file, chosen by its extension
pub fn create_parser(path: impl AsRef<Path>) -> ImportResult<Box<dyn BackupParser>> {
    let format = BackupFormat::from_path(path.as_ref())?;
    tracing::debug!("Using {} parser for {}", format, path.as_ref().display());
    Ok(parser_for(format))
}

/// Read and parse a backup file
pub fn parse_backup(
    path: impl AsRef<Path>,
    selected_tables: Option<&[String]>,
) -> ImportResult<SourceSchema> {
    let path = path.as_ref();
    let parser = create_parser(path)?;
    let content = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let schema = parser.parse(&content, selected_tables)?;
    tracing::info!(
        "Parsed {} table(s) from {} ({} warning(s))",
        schema.tables.len(),
        path.display(),
        schema.warnings.len()
    );
    Ok(schema)
}
