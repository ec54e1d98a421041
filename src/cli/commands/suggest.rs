//! `suggest` command: propose mapping rules for a backup

use std::path::PathBuf;

use erp_migration_sdk::config::AppConfig;
use erp_migration_sdk::export::MigrationManifest;
use erp_migration_sdk::import::parse_backup;
use erp_migration_sdk::mapping::{AliasRegistry, DestinationCatalog, HeuristicMatcher};
use erp_migration_sdk::models::MatchMethod;
use erp_migration_sdk::validation::validate_mappings;

use super::{emit_json, split_tables};
use crate::error::CliError;

/// Arguments for the `suggest` command
pub struct SuggestArgs {
    pub backup: PathBuf,
    /// Destination catalog JSON; the live API schema is used when absent
    pub catalog: Option<PathBuf>,
    pub tables: Option<String>,
    /// Write a migration manifest instead of bare rules
    pub manifest: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

fn load_catalog(args: &SuggestArgs, config: &AppConfig) -> Result<DestinationCatalog, CliError> {
    if let Some(path) = &args.catalog {
        return Ok(DestinationCatalog::from_json_file(path)?);
    }
    let mut introspector = erp_migration_sdk::SchemaIntrospector::http(
        config.api.base_url.clone(),
        config.introspector_config(),
        config.api.credentials(),
    )?;
    let api = introspector.get_schema(false)?;
    Ok(DestinationCatalog::from_api_schema(&api))
}

/// Handle the `suggest` command
pub fn handle_suggest(args: &SuggestArgs, config: &AppConfig) -> Result<(), CliError> {
    let selected = split_tables(args.tables.as_deref());
    let schema = parse_backup(&args.backup, selected.as_deref())?;
    let catalog = load_catalog(args, config)?;
    if catalog.is_empty() {
        return Err(CliError::InvalidArgument(
            "Destination catalog has no tables".to_string(),
        ));
    }

    let aliases = AliasRegistry::new();
    let rules = HeuristicMatcher::new(&catalog, &aliases).suggest_mappings(&schema);
    let report = validate_mappings(&schema, &rules);

    let resolved = rules.iter().filter(|r| r.is_resolved()).count();
    eprintln!();
    eprintln!("Mapping Suggestions");
    eprintln!("===================");
    eprintln!("Rules: {}", rules.len());
    eprintln!("Resolved: {}", resolved);
    eprintln!("Pending: {}", rules.len() - resolved);

    if args.verbose {
        eprintln!();
        for rule in &rules {
            let source = format!("{}.{}", rule.source_table, rule.source_columns.join("+"));
            match (&rule.target_table, &rule.target_field) {
                (Some(table), Some(field)) if rule.match_method != MatchMethod::None => eprintln!(
                    "  {} -> {}.{} ({:.0}%, {})",
                    source,
                    table,
                    field,
                    rule.confidence * 100.0,
                    rule.match_method
                ),
                (Some(table), Some(field)) => {
                    eprintln!("  {} -> {}.{} (unmatched column)", source, table, field)
                }
                _ => eprintln!("  {} -> ?", source),
            }
        }
    }

    if !report.is_valid() {
        eprintln!();
        eprintln!("Validation issues:");
        for issue in &report.issues {
            eprintln!("  {}", issue.message);
        }
    }

    if let Some(path) = &args.manifest {
        MigrationManifest::new(schema, rules)
            .with_validation(&report)
            .write_json(path)?;
        eprintln!();
        eprintln!("Manifest written to: {}", path.display());
        return Ok(());
    }

    emit_json(&rules, args.output.as_deref())
}
