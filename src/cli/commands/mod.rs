//! CLI command implementations

pub mod build;
pub mod endpoint;
pub mod introspect;
pub mod schema;
pub mod suggest;

use std::path::Path;

use crate::error::CliError;

/// Pretty JSON to `output`, or stdout when no path is given
pub(crate) fn emit_json<T: serde::Serialize>(
    value: &T,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::InvalidArgument(format!("Failed to serialize output: {}", e)))?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| CliError::FileWriteError(path.to_path_buf(), e.to_string()))?;
            eprintln!("Output written to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Split a comma-separated `--tables` value
pub(crate) fn split_tables(tables: Option<&str>) -> Option<Vec<String>> {
    tables.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}
