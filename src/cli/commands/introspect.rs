//! `introspect` command: fetch and summarize the destination API schema

use std::path::PathBuf;

use erp_migration_sdk::SchemaIntrospector;
use erp_migration_sdk::config::AppConfig;

use super::emit_json;
use crate::error::CliError;

/// Arguments for the `introspect` command
pub struct IntrospectArgs {
    /// Bypass the in-memory and file caches
    pub force: bool,
    /// Dump the normalized schema as JSON
    pub json: bool,
    pub output: Option<PathBuf>,
}

/// Handle the `introspect` command
pub fn handle_introspect(args: &IntrospectArgs, config: &AppConfig) -> Result<(), CliError> {
    let mut introspector = SchemaIntrospector::http(
        config.api.base_url.clone(),
        config.introspector_config(),
        config.api.credentials(),
    )?;
    let schema = introspector.get_schema(args.force)?;

    if args.json || args.output.is_some() {
        return emit_json(&*schema, args.output.as_deref());
    }

    println!("{}", schema.summary());
    Ok(())
}
