//! `build` command: turn source rows into API payloads

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use erp_migration_sdk::builder::{PayloadBuilder, Row, load_payload_configs};

use super::emit_json;
use crate::error::CliError;

/// Arguments for the `build` command
pub struct BuildArgs {
    /// Payload configuration (YAML or JSON, one config or a list)
    pub config: PathBuf,
    /// Source rows as `{"table": [{...}, ...]}`
    pub rows: PathBuf,
    pub output: Option<PathBuf>,
}

/// Handle the `build` command
pub fn handle_build(args: &BuildArgs) -> Result<(), CliError> {
    let configs = load_payload_configs(&args.config)?;

    let content = std::fs::read_to_string(&args.rows)
        .map_err(|e| CliError::FileReadError(args.rows.clone(), e.to_string()))?;
    let data: HashMap<String, Vec<Row>> = serde_json::from_str(&content)
        .map_err(|e| CliError::InvalidArgument(format!("Failed to parse rows: {}", e)))?;

    let outcomes = PayloadBuilder::new().build_tables(&configs, &data);

    eprintln!();
    eprintln!("Payload Results");
    eprintln!("===============");
    for (table, outcome) in &outcomes {
        eprintln!(
            "{}: {} built, {} skipped",
            table,
            outcome.payloads.len(),
            outcome.skipped.len()
        );
        for skipped in &outcome.skipped {
            eprintln!("  row {}: {}", skipped.index, skipped.reason);
        }
    }

    let payloads: BTreeMap<&str, &Vec<Row>> = outcomes
        .iter()
        .map(|(table, outcome)| (table.as_str(), &outcome.payloads))
        .collect();
    emit_json(&payloads, args.output.as_deref())
}
