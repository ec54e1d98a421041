//! `schema` command: extract a source schema from a backup

use std::path::PathBuf;

use erp_migration_sdk::import::parse_backup;

use super::{emit_json, split_tables};
use crate::error::CliError;

/// Arguments for the `schema` command
pub struct SchemaArgs {
    pub backup: PathBuf,
    pub tables: Option<String>,
    pub output: Option<PathBuf>,
}

/// Handle the `schema` command
pub fn handle_schema(args: &SchemaArgs) -> Result<(), CliError> {
    let selected = split_tables(args.tables.as_deref());
    let schema = parse_backup(&args.backup, selected.as_deref())?;

    eprintln!("Source: {} ({})", args.backup.display(), schema.database_type);
    eprintln!("Tables: {}", schema.tables.len());
    eprintln!("Estimated rows: {}", schema.total_estimated_rows);
    if !schema.warnings.is_empty() {
        eprintln!("Skipped: {}", schema.warnings.len());
        for warning in &schema.warnings {
            eprintln!("  {}", warning);
        }
    }

    emit_json(&schema, args.output.as_deref())
}
