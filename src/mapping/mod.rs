//! Schema mapping between legacy sources and the destination API
//!
//! This module provides functionality to:
//! - Propose [`MappingRule`](crate::models::MappingRule)s from a source schema
//!   to a destination catalog (exact, alias, then fuzzy name matching)
//! - Resolve source table names to REST endpoints
//! - Build the destination catalog from an introspected API schema
//!
//! # Example
//!
//! ```rust
//! use erp_migration_sdk::mapping::{
//!     AliasRegistry, DestinationCatalog, DestinationTable, HeuristicMatcher,
//! };
//! use erp_migration_sdk::import::SqlParser;
//!
//! let schema = SqlParser::new()
//!     .parse_sql("CREATE TABLE clientes (id INT PRIMARY KEY, nome VARCHAR(80));", None);
//! let catalog = DestinationCatalog::new(vec![DestinationTable::new("Customer", vec!["id", "name"])]);
//! let aliases = AliasRegistry::new();
//!
//! let rules = HeuristicMatcher::new(&catalog, &aliases).suggest_mappings(&schema);
//! assert_eq!(rules[1].target_field.as_deref(), Some("name"));
//! ```

mod aliases;
mod catalog;
mod config;
mod endpoint;
mod error;
mod matcher;
mod similarity;

pub use aliases::AliasRegistry;
pub use catalog::{DestinationCatalog, DestinationTable};
pub use config::MatcherConfig;
pub use endpoint::{EndpointMapper, EndpointSuggestion, clean_table_name};
pub use error::{MappingError, MappingResult};
pub use matcher::{HeuristicMatcher, TableMatch};
pub use similarity::{levenshtein_distance, similarity};
