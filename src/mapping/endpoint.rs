//! Source table name to REST endpoint resolution

use serde::{Deserialize, Serialize};

use super::aliases::AliasRegistry;
use super::config::MatcherConfig;
use super::similarity::{best_match, similarity};

const TABLE_PREFIXES: [&str; 7] = ["tb_", "tbl_", "src_", "dst_", "tmp_", "v_", "t_"];
const TABLE_SUFFIXES: [&str; 6] = ["_data", "_info", "_detail", "_details", "_list", "_log"];

/// Strip common table-name prefixes and suffixes
///
/// Each known prefix and suffix is removed at most once, in list order.
/// Expects a lower-case name.
pub fn clean_table_name(name: &str) -> String {
    let mut name = name;
    for prefix in TABLE_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }
    for suffix in TABLE_SUFFIXES {
        if let Some(rest) = name.strip_suffix(suffix) {
            name = rest;
        }
    }
    name.to_string()
}

/// A candidate endpoint with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSuggestion {
    pub endpoint: String,
    pub score: f64,
}

/// Resolves source table names to REST paths from the alias registry
pub struct EndpointMapper<'a> {
    aliases: &'a AliasRegistry,
    config: MatcherConfig,
}

impl<'a> EndpointMapper<'a> {
    pub fn new(aliases: &'a AliasRegistry) -> Self {
        Self {
            aliases,
            config: MatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// REST path for a table: exact alias, cleaned alias, then fuzzy
    pub fn get_endpoint(&self, table_name: &str) -> Option<&'a str> {
        let aliases: &'a AliasRegistry = self.aliases;
        let name = table_name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        if let Some(path) = aliases.endpoint(&name) {
            return Some(path);
        }

        let cleaned = clean_table_name(&name);
        if let Some(path) = aliases.endpoint(&cleaned) {
            tracing::debug!("Resolved {} via cleaned name {}", table_name, cleaned);
            return Some(path);
        }

        let (alias, score) = best_match(
            &cleaned,
            aliases.endpoint_entries().map(|(alias, _)| alias),
            self.config.endpoint_threshold,
        )?;
        tracing::debug!("Fuzzy endpoint match {} -> {} ({:.2})", table_name, alias, score);
        aliases.endpoint(alias)
    }

    /// Up to `limit` distinct endpoints scoring at least the suggestion
    /// threshold, best first
    pub fn suggest_endpoints(&self, table_name: &str, limit: usize) -> Vec<EndpointSuggestion> {
        let name = clean_table_name(&table_name.trim().to_lowercase());
        if name.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(&str, f64)> = self
            .aliases
            .endpoint_entries()
            .map(|(alias, path)| (path, similarity(&name, alias)))
            .filter(|(_, score)| *score >= self.config.suggestion_threshold)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut suggestions: Vec<EndpointSuggestion> = Vec::new();
        for (path, score) in scored {
            if suggestions.iter().any(|s| s.endpoint == path) {
                continue;
            }
            suggestions.push(EndpointSuggestion {
                endpoint: path.to_string(),
                score,
            });
            if suggestions.len() >= limit {
                break;
            }
        }
        suggestions
    }

    /// Every known endpoint, sorted and unique
    pub fn all_endpoints(&self) -> Vec<&'a str> {
        self.aliases.endpoint_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_table_name() {
        assert_eq!(clean_table_name("tbl_products_data"), "products");
        assert_eq!(clean_table_name("src_pedidos_list"), "pedidos");
        assert_eq!(clean_table_name("customers"), "customers");
    }

    #[test]
    fn test_get_endpoint() {
        let aliases = AliasRegistry::new();
        let mapper = EndpointMapper::new(&aliases);
        assert_eq!(mapper.get_endpoint("tbl_products_data"), Some("/v1/products"));
        assert_eq!(mapper.get_endpoint(" Pedidos "), Some("/v1/orders"));
        assert_eq!(mapper.get_endpoint("fornecedore"), Some("/v1/suppliers"));
        assert_eq!(mapper.get_endpoint("xyzzy"), None);
        assert_eq!(mapper.get_endpoint(""), None);
    }

    #[test]
    fn test_suggest_endpoints_unique_and_sorted() {
        let aliases = AliasRegistry::new();
        let mapper = EndpointMapper::new(&aliases);
        let suggestions = mapper.suggest_endpoints("produtos", 5);
        assert_eq!(suggestions[0].endpoint, "/v1/products");
        assert_eq!(suggestions[0].score, 1.0);
        let mut endpoints: Vec<&str> = suggestions.iter().map(|s| s.endpoint.as_str()).collect();
        endpoints.dedup();
        assert_eq!(endpoints.len(), suggestions.len());
        assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));

        assert_eq!(mapper.suggest_endpoints("produtos", 1).len(), 1);
    }

    #[test]
    fn test_suggest_endpoints_zero_limit() {
        let aliases = AliasRegistry::new();
        let mapper = EndpointMapper::new(&aliases);
        assert!(mapper.suggest_endpoints("produtos", 0).is_empty());
    }

    #[test]
    fn test_all_endpoints() {
        let aliases = AliasRegistry::new();
        let mapper = EndpointMapper::new(&aliases);
        assert!(mapper.all_endpoints().contains(&"/v1/suppliers"));
    }
}
