//! `endpoint` command: resolve table names to REST paths

use erp_migration_sdk::mapping::{AliasRegistry, EndpointMapper};

use crate::error::CliError;

/// Arguments for the `endpoint` command
pub struct EndpointArgs {
    pub tables: Vec<String>,
    /// Number of fuzzy suggestions shown for unresolved tables
    pub suggestions: usize,
    pub list: bool,
}

/// Handle the `endpoint` command
pub fn handle_endpoint(args: &EndpointArgs) -> Result<(), CliError> {
    let aliases = AliasRegistry::new();
    let mapper = EndpointMapper::new(&aliases);

    if args.list {
        for endpoint in mapper.all_endpoints() {
            println!("{}", endpoint);
        }
        return Ok(());
    }

    if args.tables.is_empty() {
        return Err(CliError::InvalidArgument(
            "At least one table name is required".to_string(),
        ));
    }

    for table in &args.tables {
        match mapper.get_endpoint(table) {
            Some(endpoint) => println!("{}\t{}", table, endpoint),
            None => {
                println!("{}\t-", table);
                let suggestions = mapper.suggest_endpoints(table, args.suggestions);
                if !suggestions.is_empty() {
                    let listed: Vec<String> = suggestions
                        .iter()
                        .map(|s| format!("{} ({:.0}%)", s.endpoint, s.score * 100.0))
                        .collect();
                    eprintln!("  Suggestions: {}", listed.join(", "));
                }
            }
        }
    }
    Ok(())
}
