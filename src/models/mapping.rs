//! Mapping model
//!
//! Two families of types live here:
//!
//! - [`MappingRule`]: derived data, proposed by the heuristic matcher (one per
//!   source column) and later confirmed or edited.
//! - [`FieldMapping`], [`AttributeMapping`], [`PayloadConfig`]: user-authored
//!   configuration describing how a destination payload is compiled from a
//!   source row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cardinality of a mapping rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MappingType {
    #[default]
    #[serde(rename = "1-to-1")]
    OneToOne,
    #[serde(rename = "N-to-1")]
    ManyToOne,
    #[serde(rename = "1-to-N")]
    OneToMany,
}

impl std::fmt::Display for MappingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingType::OneToOne => write!(f, "1-to-1"),
            MappingType::ManyToOne => write!(f, "N-to-1"),
            MappingType::OneToMany => write!(f, "1-to-N"),
        }
    }
}

/// How a mapping rule's target was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Case-insensitive name equality
    Exact,
    /// Through the alias registry
    Alias,
    /// Edit-distance similarity above threshold
    Fuzzy,
    /// Assigned by a user
    Manual,
    /// Unresolved
    #[default]
    None,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Alias => write!(f, "alias"),
            MatchMethod::Fuzzy => write!(f, "fuzzy"),
            MatchMethod::Manual => write!(f, "manual"),
            MatchMethod::None => write!(f, "none"),
        }
    }
}

fn default_transformer() -> String {
    "NONE".to_string()
}

/// Proposed or confirmed correspondence between source columns and one
/// destination field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub source_table: String,
    /// Ordered, non-empty
    pub source_columns: Vec<String>,
    pub target_table: Option<String>,
    pub target_field: Option<String>,
    #[serde(default)]
    pub mapping_type: MappingType,
    #[serde(default = "default_transformer")]
    pub transformer: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub transformer_config: HashMap<String, Value>,
    /// In `[0, 1]`
    pub confidence: f64,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub match_method: MatchMethod,
}

impl MappingRule {
    /// Unresolved 1-to-1 rule for a single column
    pub fn pending(source_table: impl Into<String>, source_column: impl Into<String>) -> Self {
        Self {
            source_table: source_table.into(),
            source_columns: vec![source_column.into()],
            target_table: None,
            target_field: None,
            mapping_type: MappingType::OneToOne,
            transformer: default_transformer(),
            transformer_config: HashMap::new(),
            confidence: 0.0,
            ignored: false,
            description: String::new(),
            match_method: MatchMethod::None,
        }
    }

    pub fn with_target(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.target_table = Some(table.into());
        self.target_field = Some(field.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_match_method(mut self, method: MatchMethod) -> Self {
        self.match_method = method;
        self
    }

    /// Resolve the rule by hand; confidence becomes 1.0
    pub fn assign_target(&mut self, table: impl Into<String>, field: impl Into<String>) {
        self.target_table = Some(table.into());
        self.target_field = Some(field.into());
        self.confidence = 1.0;
        self.match_method = MatchMethod::Manual;
    }

    pub fn ignore(&mut self) {
        self.ignored = true;
    }

    pub fn is_resolved(&self) -> bool {
        self.target_table.is_some() && self.target_field.is_some()
    }
}

/// Shape of a destination field built from a source row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Value emitted as-is
    #[default]
    Direct,
    /// `{"id": value}`
    Nested,
    /// `[{"id": value}]`
    Array,
    /// `[{"attribute": {"id", "name"}, "value"}]` from several columns
    Attribute,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Direct => write!(f, "direct"),
            FieldKind::Nested => write!(f, "nested"),
            FieldKind::Array => write!(f, "array"),
            FieldKind::Attribute => write!(f, "attribute"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Folds one source column into an entry of a generic attributes array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub source_column: String,
    #[serde(default)]
    pub attribute_id: Option<i64>,
    #[serde(default)]
    pub attribute_name: String,
    #[serde(default)]
    pub transformer: Option<String>,
    /// Omit the entry when the column is absent or null (default: true)
    #[serde(default = "default_true")]
    pub skip_if_null: bool,
    /// Output format, `{value}` is replaced by the rendered value
    #[serde(default)]
    pub format_string: Option<String>,
}

impl AttributeMapping {
    pub fn new(source_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            attribute_id: None,
            attribute_name: String::new(),
            transformer: None,
            skip_if_null: true,
            format_string: None,
        }
    }

    pub fn with_attribute(mut self, id: i64, name: impl Into<String>) -> Self {
        self.attribute_id = Some(id);
        self.attribute_name = name.into();
        self
    }

    pub fn with_format(mut self, format_string: impl Into<String>) -> Self {
        self.format_string = Some(format_string.into());
        self
    }

    pub fn with_transformer(mut self, transformer: impl Into<String>) -> Self {
        self.transformer = Some(transformer.into());
        self
    }

    pub fn with_skip_if_null(mut self, skip: bool) -> Self {
        self.skip_if_null = skip;
        self
    }
}

/// How one destination field is populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Source column; unused for `attribute` fields
    #[serde(default)]
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub transformer: Option<String>,
    #[serde(default)]
    pub nested_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_mappings: Vec<AttributeMapping>,
    /// Used when the source column is absent or null
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Remap the value through `PayloadConfig::id_mappings[id_table]`
    #[serde(default)]
    pub id_table: Option<String>,
    /// `${...}` template evaluated against the row instead of reading `source`
    #[serde(default)]
    pub template: Option<String>,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            transformer: None,
            nested_endpoint: None,
            attribute_mappings: Vec::new(),
            default_value: None,
            id_table: None,
            template: None,
        }
    }

    pub fn direct(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, FieldKind::Direct)
    }

    /// `attribute` field built from the given attribute mappings
    pub fn attributes(target: impl Into<String>, mappings: Vec<AttributeMapping>) -> Self {
        let mut mapping = Self::new("", target, FieldKind::Attribute);
        mapping.attribute_mappings = mappings;
        mapping
    }

    pub fn with_transformer(mut self, transformer: impl Into<String>) -> Self {
        self.transformer = Some(transformer.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_id_table(mut self, table: impl Into<String>) -> Self {
        self.id_table = Some(table.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// Per-table payload configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadConfig {
    pub table_name: String,
    pub endpoint: String,
    /// Applied in order; later targets overwrite earlier ones
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    /// `{logical_table: {source_id: destination_id}}`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub id_mappings: HashMap<String, HashMap<String, Value>>,
    /// Keys every built payload must contain
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
    #[serde(default = "default_true")]
    pub validate_required: bool,
}

impl PayloadConfig {
    pub fn new(table_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            endpoint: endpoint.into(),
            mappings: Vec::new(),
            id_mappings: HashMap::new(),
            required_fields: Vec::new(),
            validate_required: true,
        }
    }

    pub fn with_mappings(mut self, mappings: Vec<FieldMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    /// Register `source_id -> destination_id` pairs for a logical table
    pub fn with_id_mapping(
        mut self,
        table: impl Into<String>,
        pairs: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        self.id_mappings
            .entry(table.into())
            .or_default()
            .extend(pairs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_type_wire_names() {
        let json = serde_json::to_string(&MappingType::ManyToOne).unwrap();
        assert_eq!(json, "\"N-to-1\"");
        let parsed: MappingType = serde_json::from_str("\"1-to-N\"").unwrap();
        assert_eq!(parsed, MappingType::OneToMany);
    }

    #[test]
    fn test_assign_target_resolves_rule() {
        let mut rule = MappingRule::pending("clientes", "nome");
        assert!(!rule.is_resolved());
        assert_eq!(rule.transformer, "NONE");

        rule.assign_target("Customer", "name");
        assert!(rule.is_resolved());
        assert_eq!(rule.confidence, 1.0);
        assert_eq!(rule.match_method, MatchMethod::Manual);
    }

    #[test]
    fn test_field_mapping_defaults_from_yaml() {
        let yaml = r#"
source: nome
target: name
"#;
        let mapping: FieldMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(mapping.kind, FieldKind::Direct);
        assert!(mapping.transformer.is_none());
        assert!(mapping.attribute_mappings.is_empty());
    }

    #[test]
    fn test_attribute_mapping_skips_null_by_default() {
        let attr: AttributeMapping =
            serde_json::from_value(serde_json::json!({"source_column": "peso"})).unwrap();
        assert!(attr.skip_if_null);
        assert_eq!(attr.attribute_id, None);
    }
}
