//! Mapping, validation and manifest tests

use erp_migration_sdk::export::MigrationManifest;
use erp_migration_sdk::import::SqlParser;
use erp_migration_sdk::mapping::{
    AliasRegistry, DestinationCatalog, EndpointMapper, HeuristicMatcher, MappingError,
    MatcherConfig,
};
use erp_migration_sdk::models::{MatchMethod, SourceSchema};
use erp_migration_sdk::validation::{IssueKind, validate_mappings};
use tempfile::TempDir;

const CATALOG_JSON: &str = r#"{
    "tables": [
        {"name": "Customer", "columns": ["id", "name", "email", "phone", "createdAt"], "endpoint": "/v1/customers"},
        {"name": "Product", "columns": ["id", "name", "price"]}
    ]
}"#;

const LEGACY_SQL: &str = r#"
CREATE TABLE clientes (
    codigo INT PRIMARY KEY,
    nome VARCHAR(100) NOT NULL,
    email VARCHAR(100),
    telefone VARCHAR(20),
    obs TEXT
);
CREATE TABLE produto (id INT, name VARCHAR(50), price DECIMAL(10, 2));
CREATE TABLE logs_sistema (id INT, msg TEXT, area GEOMETRY);
"#;

fn legacy_schema() -> SourceSchema {
    SqlParser::new().parse_sql(LEGACY_SQL, None)
}

mod heuristic_matcher_tests {
    use super::*;

    #[test]
    fn test_suggest_mappings_end_to_end() {
        let catalog = DestinationCatalog::from_json_str(CATALOG_JSON).unwrap();
        let aliases = AliasRegistry::new();
        let rules = HeuristicMatcher::new(&catalog, &aliases).suggest_mappings(&legacy_schema());

        // 5 + 3 + 3 columns
        assert_eq!(rules.len(), 11);

        let telefone = rules
            .iter()
            .find(|r| r.source_columns == vec!["telefone".to_string()])
            .unwrap();
        assert_eq!(telefone.target_table.as_deref(), Some("Customer"));
        assert_eq!(telefone.target_field.as_deref(), Some("phone"));
        assert_eq!(telefone.match_method, MatchMethod::Alias);
        assert_eq!(telefone.confidence, 0.9);

        let obs = rules
            .iter()
            .find(|r| r.source_columns == vec!["obs".to_string()])
            .unwrap();
        assert_eq!(obs.target_table.as_deref(), Some("Customer"));
        assert_eq!(obs.target_field.as_deref(), Some("obs"));
        assert_eq!(obs.match_method, MatchMethod::None);
        assert_eq!(obs.confidence, 0.6);

        let price = rules
            .iter()
            .find(|r| r.source_table == "produto" && r.source_columns[0] == "price")
            .unwrap();
        assert_eq!(price.target_table.as_deref(), Some("Product"));
        assert_eq!(price.match_method, MatchMethod::Exact);

        let pending: Vec<_> = rules
            .iter()
            .filter(|r| r.source_table == "logs_sistema")
            .collect();
        assert_eq!(pending.len(), 3);
        assert!(pending.iter().all(|r| r.target_table.is_none() && r.confidence == 0.0));
    }

    #[test]
    fn test_stricter_threshold_rejects_fuzzy_table() {
        let catalog = DestinationCatalog::from_json_str(CATALOG_JSON).unwrap();
        let aliases = AliasRegistry::empty();

        let lenient = HeuristicMatcher::new(&catalog, &aliases);
        assert!(lenient.match_table("Costumer").is_some());

        let strict = HeuristicMatcher::new(&catalog, &aliases)
            .with_config(MatcherConfig::new().with_table_threshold(0.95));
        assert!(strict.match_table("Costumer").is_none());
    }

    #[test]
    fn test_catalog_errors() {
        assert!(matches!(
            DestinationCatalog::from_json_str("{not json"),
            Err(MappingError::CatalogParse(_))
        ));
        assert!(matches!(
            DestinationCatalog::from_json_file("/nonexistent/catalog.json"),
            Err(MappingError::CatalogRead { .. })
        ));
    }
}

mod endpoint_mapper_tests {
    use super::*;

    #[test]
    fn test_endpoint_resolution() {
        let aliases = AliasRegistry::new();
        let mapper = EndpointMapper::new(&aliases);

        assert_eq!(mapper.get_endpoint("Pedidos"), Some("/v1/orders"));
        assert_eq!(mapper.get_endpoint("tb_fornecedores"), Some("/v1/suppliers"));
        assert_eq!(mapper.get_endpoint("costumers"), Some("/v1/customers"));
        assert_eq!(mapper.get_endpoint("xyz_abc"), None);
        assert_eq!(mapper.get_endpoint(""), None);
    }

    #[test]
    fn test_suggestions_are_unique_and_sorted() {
        let aliases = AliasRegistry::new();
        let mapper = EndpointMapper::new(&aliases);

        let suggestions = mapper.suggest_endpoints("categoriass", 5);
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].endpoint, "/v1/categories");
        for pair in suggestions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            assert_ne!(pair[0].endpoint, pair[1].endpoint);
        }

        let all = mapper.all_endpoints();
        assert_eq!(all.len(), 8);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}

mod validation_and_manifest_tests {
    use super::*;

    #[test]
    fn test_validation_flags_pending_and_unknown_types() {
        let schema = legacy_schema();
        let catalog = DestinationCatalog::from_json_str(CATALOG_JSON).unwrap();
        let aliases = AliasRegistry::new();
        let mut rules = HeuristicMatcher::new(&catalog, &aliases).suggest_mappings(&schema);

        // Ignore the log message column
        rules
            .iter_mut()
            .filter(|r| r.source_table == "logs_sistema" && r.source_columns[0] == "msg")
            .for_each(|r| r.ignore());

        let report = validate_mappings(&schema, &rules);
        assert_eq!(report.of_kind(IssueKind::MissingTarget).count(), 2);

        let unknown: Vec<_> = report.of_kind(IssueKind::UnknownType).collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].message, "Unknown type: logs_sistema.area = GEOMETRY");
    }

    #[test]
    fn test_manifest_written_with_validation_status() {
        let schema = legacy_schema();
        let catalog = DestinationCatalog::from_json_str(CATALOG_JSON).unwrap();
        let aliases = AliasRegistry::new();
        let rules = HeuristicMatcher::new(&catalog, &aliases).suggest_mappings(&schema);
        let report = validate_mappings(&schema, &rules);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("migrations/001/manifest.json");
        MigrationManifest::new(schema, rules)
            .with_validation(&report)
            .write_json(&path)
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["source_tables"], 3);
        assert_eq!(written["metadata"]["validation_result"], "FAILED");
        assert_eq!(written["mappings"].as_array().unwrap().len(), 11);
        assert_eq!(written["schema"]["tables"][0]["name"], "clientes");
    }
}
