//! Heuristic table and column matching

use super::aliases::AliasRegistry;
use super::catalog::{DestinationCatalog, DestinationTable};
use super::config::MatcherConfig;
use super::similarity::best_match;
use crate::models::{MappingRule, MatchMethod, SourceSchema, SourceTable};

/// Outcome of matching one source table
#[derive(Debug, Clone, PartialEq)]
pub struct TableMatch<'c> {
    pub table: &'c DestinationTable,
    pub method: MatchMethod,
    /// Similarity for fuzzy matches, 1.0 otherwise
    pub score: f64,
}

/// Proposes mapping rules from a source schema to a destination catalog
///
/// Tables and columns are matched in three passes: exact case-insensitive
/// name, alias lookup, then the most similar name at or above the configured
/// threshold. Every source column yields exactly one rule; columns of an
/// unmatched table yield pending rules with confidence 0.0.
pub struct HeuristicMatcher<'a> {
    catalog: &'a DestinationCatalog,
    aliases: &'a AliasRegistry,
    config: MatcherConfig,
}

impl<'a> HeuristicMatcher<'a> {
    pub fn new(catalog: &'a DestinationCatalog, aliases: &'a AliasRegistry) -> Self {
        Self {
            catalog,
            aliases,
            config: MatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// One rule per source column, in schema order
    pub fn suggest_mappings(&self, schema: &SourceSchema) -> Vec<MappingRule> {
        let mut rules = Vec::new();
        for table in &schema.tables {
            rules.extend(self.suggest_table(table));
        }
        tracing::info!(
            "Suggested {} mapping rule(s), {} resolved",
            rules.len(),
            rules.iter().filter(|r| r.is_resolved()).count()
        );
        rules
    }

    fn suggest_table(&self, source: &SourceTable) -> Vec<MappingRule> {
        let Some(table_match) = self.match_table(&source.name) else {
            tracing::debug!("No destination table for {}", source.name);
            return source
                .columns
                .iter()
                .map(|c| MappingRule::pending(&source.name, &c.name))
                .collect();
        };

        tracing::debug!(
            "Matched table {} -> {} ({}, {:.2})",
            source.name,
            table_match.table.name,
            table_match.method,
            table_match.score
        );

        let strong_table = table_match.method != MatchMethod::Fuzzy;
        source
            .columns
            .iter()
            .map(|column| {
                let (field, method) = match self.match_column(&column.name, table_match.table) {
                    Some((field, method)) => (field.to_string(), method),
                    None => (column.name.clone(), MatchMethod::None),
                };
                let confidence = if strong_table && method != MatchMethod::None {
                    self.config.strong_confidence
                } else {
                    self.config.weak_confidence
                };
                MappingRule::pending(&source.name, &column.name)
                    .with_target(&table_match.table.name, field)
                    .with_confidence(confidence)
                    .with_match_method(method)
            })
            .collect()
    }

    /// Destination table for a source table name
    ///
    /// An alias whose target is missing from the catalog falls through to
    /// fuzzy matching.
    pub fn match_table(&self, name: &str) -> Option<TableMatch<'a>> {
        let catalog: &'a DestinationCatalog = self.catalog;

        if let Some(table) = catalog.get_table(name) {
            return Some(TableMatch {
                table,
                method: MatchMethod::Exact,
                score: 1.0,
            });
        }

        if let Some(table) = self
            .aliases
            .table_alias(name)
            .and_then(|target| catalog.get_table(target))
        {
            return Some(TableMatch {
                table,
                method: MatchMethod::Alias,
                score: 1.0,
            });
        }

        let (best, score) = best_match(
            name,
            catalog.tables.iter().map(|t| t.name.as_str()),
            self.config.table_threshold,
        )?;
        let table = catalog.get_table(best)?;
        Some(TableMatch {
            table,
            method: MatchMethod::Fuzzy,
            score,
        })
    }

    /// Destination column of `table` for a source column name
    pub fn match_column<'t>(
        &self,
        name: &str,
        table: &'t DestinationTable,
    ) -> Option<(&'t str, MatchMethod)> {
        let find = |wanted: &str| {
            table
                .columns
                .iter()
                .find(|c| c.eq_ignore_ascii_case(wanted))
                .map(String::as_str)
        };

        if let Some(column) = find(name) {
            return Some((column, MatchMethod::Exact));
        }
        if let Some(column) = self.aliases.column_alias(name).and_then(find) {
            return Some((column, MatchMethod::Alias));
        }
        best_match(
            name,
            table.columns.iter().map(String::as_str),
            self.config.column_threshold,
        )
        .map(|(column, _)| (column, MatchMethod::Fuzzy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceColumn;

    fn catalog() -> DestinationCatalog {
        DestinationCatalog::new(vec![
            DestinationTable::new("Customer", vec!["id", "name", "email", "phone", "createdAt"]),
            DestinationTable::new("Product", vec!["id", "name", "price"]),
        ])
    }

    fn table(name: &str, columns: &[&str]) -> SourceTable {
        SourceTable::new(name).with_columns(
            columns
                .iter()
                .map(|c| SourceColumn::new(*c, "VARCHAR"))
                .collect(),
        )
    }

    #[test]
    fn test_client_and_customer_match_same_table() {
        let catalog = catalog();
        let aliases = AliasRegistry::new();
        let matcher = HeuristicMatcher::new(&catalog, &aliases);

        let customer = matcher.match_table("customer").unwrap();
        let client = matcher.match_table("client").unwrap();
        assert_eq!(customer.table.name, "Customer");
        assert_eq!(customer.method, MatchMethod::Exact);
        assert_eq!(client.table.name, customer.table.name);
        assert_eq!(client.method, MatchMethod::Alias);
    }

    #[test]
    fn test_fuzzy_table_threshold() {
        let catalog = catalog();
        let aliases = AliasRegistry::empty();
        let matcher = HeuristicMatcher::new(&catalog, &aliases);

        let m = matcher.match_table("Products").unwrap();
        assert_eq!(m.table.name, "Product");
        assert_eq!(m.method, MatchMethod::Fuzzy);
        assert!(matcher.match_table("warehouse").is_none());
    }

    #[test]
    fn test_unmatched_table_yields_pending_rules() {
        let catalog = catalog();
        let aliases = AliasRegistry::new();
        let matcher = HeuristicMatcher::new(&catalog, &aliases);

        let mut schema = SourceSchema::new("sql");
        schema.tables.push(table("zz_audit", &["when", "who"]));
        let rules = matcher.suggest_mappings(&schema);

        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.target_table.is_none() && r.confidence == 0.0));
        assert_eq!(rules[1].source_columns, vec!["who"]);
    }

    #[test]
    fn test_column_rules_and_confidence() {
        let catalog = catalog();
        let aliases = AliasRegistry::new();
        let matcher = HeuristicMatcher::new(&catalog, &aliases);

        let mut schema = SourceSchema::new("sql");
        schema.tables.push(table(
            "clientes",
            &["ID", "nome", "emails", "created_at", "legacy_flag"],
        ));
        let rules = matcher.suggest_mappings(&schema);
        assert_eq!(rules.len(), 5);
        assert!(rules.iter().all(|r| r.target_table.as_deref() == Some("Customer")));

        let fields: Vec<&str> = rules
            .iter()
            .map(|r| r.target_field.as_deref().unwrap())
            .collect();
        assert_eq!(fields, vec!["id", "name", "email", "createdAt", "legacy_flag"]);

        assert_eq!(rules[0].match_method, MatchMethod::Exact);
        assert_eq!(rules[1].match_method, MatchMethod::Alias);
        assert_eq!(rules[2].match_method, MatchMethod::Fuzzy);
        assert_eq!(rules[0].confidence, 0.9);
        assert_eq!(rules[2].confidence, 0.9);
        assert_eq!(rules[4].match_method, MatchMethod::None);
        assert_eq!(rules[4].confidence, 0.6);
    }

    #[test]
    fn test_fuzzy_table_match_is_weak() {
        let catalog = catalog();
        let aliases = AliasRegistry::empty();
        let matcher = HeuristicMatcher::new(&catalog, &aliases);

        let mut schema = SourceSchema::new("csv");
        schema.tables.push(table("Customers", &["id"]));
        let rules = matcher.suggest_mappings(&schema);
        assert_eq!(rules[0].target_field.as_deref(), Some("id"));
        assert_eq!(rules[0].confidence, 0.6);
    }
}
