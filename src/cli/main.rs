//! erp-migrate: command-line front end for the ERP migration SDK

mod commands;
mod error;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use erp_migration_sdk::config::AppConfig;
use tracing_subscriber::EnvFilter;

use commands::build::{BuildArgs, handle_build};
use commands::endpoint::{EndpointArgs, handle_endpoint};
use commands::introspect::{IntrospectArgs, handle_introspect};
use commands::schema::{SchemaArgs, handle_schema};
use commands::suggest::{SuggestArgs, handle_suggest};

#[derive(Parser)]
#[command(name = "erp-migrate", version, about = "Migrate legacy databases into an ERP API")]
struct Cli {
    /// TOML settings file (API, directories)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the source schema from a backup file
    Schema {
        backup: PathBuf,
        /// Comma-separated tables to keep
        #[arg(long)]
        tables: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Propose mapping rules for a backup
    Suggest {
        backup: PathBuf,
        /// Destination catalog JSON (defaults to the live API schema)
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        tables: Option<String>,
        /// Write a migration manifest to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve table names to REST endpoints
    Endpoint {
        tables: Vec<String>,
        /// Fuzzy suggestions shown for unresolved tables
        #[arg(long, default_value_t = 3)]
        suggestions: usize,
        /// List every known endpoint
        #[arg(long)]
        list: bool,
    },
    /// Fetch and summarize the destination API schema
    Introspect {
        /// Ignore cached schemas
        #[arg(long)]
        force: bool,
        #[arg(long)]
        json: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build API payloads from source rows
    Build {
        /// Payload configuration (YAML or JSON)
        #[arg(long)]
        config: PathBuf,
        /// Rows JSON keyed by table name
        #[arg(long)]
        rows: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(cli.settings.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Schema {
            backup,
            tables,
            output,
        } => handle_schema(&SchemaArgs {
            backup,
            tables,
            output,
        })?,
        Command::Suggest {
            backup,
            catalog,
            tables,
            manifest,
            output,
        } => handle_suggest(
            &SuggestArgs {
                backup,
                catalog,
                tables,
                manifest,
                output,
                verbose: cli.verbose,
            },
            &config,
        )?,
        Command::Endpoint {
            tables,
            suggestions,
            list,
        } => handle_endpoint(&EndpointArgs {
            tables,
            suggestions,
            list,
        })?,
        Command::Introspect {
            force,
            json,
            output,
        } => handle_introspect(&IntrospectArgs { force, json, output }, &config)?,
        Command::Build {
            config: payload_config,
            rows,
            output,
        } => handle_build(&BuildArgs {
            config: payload_config,
            rows,
            output,
        })?,
    }

    Ok(())
}
