//! Destination API model
//!
//! Normalized view of an OpenAPI 3.x document: endpoints keyed by
//! `"{METHOD} {path}"`, each with typed, nested request/response field trees.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON wire type of an endpoint field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    #[default]
    Unknown,
}

impl FieldType {
    /// Parse an OpenAPI `type` keyword
    pub fn from_openapi(value: &str) -> Self {
        match value {
            "string" => FieldType::String,
            "integer" => FieldType::Integer,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "object" => FieldType::Object,
            "array" => FieldType::Array,
            _ => FieldType::Unknown,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Object => write!(f, "object"),
            FieldType::Array => write!(f, "array"),
            FieldType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Semantic refinement of a string field, derived from its `format`
///
/// Several semantic types share the `string` wire type; this keeps them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    Date,
    DateTime,
    Uuid,
    Email,
    Uri,
    Plain,
}

/// A field of a request or response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EndpointField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Populated only for `object` fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested_fields: BTreeMap<String, EndpointField>,
    /// Populated only for `array` fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_item_type: Option<Box<EndpointField>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
}

impl EndpointField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    /// Field for a `$ref` that could not be resolved
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Unknown)
    }

    pub fn semantic_type(&self) -> SemanticType {
        if self.field_type != FieldType::String {
            return SemanticType::Plain;
        }
        match self.format.as_deref() {
            Some("date") => SemanticType::Date,
            Some("date-time") => SemanticType::DateTime,
            Some("uuid") => SemanticType::Uuid,
            Some("email") => SemanticType::Email,
            Some("uri") | Some("url") => SemanticType::Uri,
            _ => SemanticType::Plain,
        }
    }

    pub fn is_object(&self) -> bool {
        self.field_type == FieldType::Object
    }
}

/// One operation on one path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSchema {
    pub path: String,
    /// Upper-case HTTP method
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub request_body_fields: BTreeMap<String, EndpointField>,
    #[serde(default)]
    pub response_fields: BTreeMap<String, EndpointField>,
    /// Names of required request body fields
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl EndpointSchema {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into().to_uppercase(),
            summary: None,
            request_body_fields: BTreeMap::new(),
            response_fields: BTreeMap::new(),
            required_fields: Vec::new(),
        }
    }

    /// Key under which this endpoint is stored in [`ApiSchema::endpoints`]
    pub fn key(&self) -> String {
        endpoint_key(&self.method, &self.path)
    }
}

/// Build the `"{METHOD} {path}"` endpoint key
pub fn endpoint_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

/// Normalized destination API description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSchema {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointSchema>,
    /// Raw `components.schemas`, only used while resolving `$ref`s
    #[serde(skip)]
    pub definitions: HashMap<String, Value>,
}

impl ApiSchema {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            base_url: String::new(),
            endpoints: BTreeMap::new(),
            definitions: HashMap::new(),
        }
    }

    pub fn get_endpoint(&self, path: &str, method: &str) -> Option<&EndpointSchema> {
        self.endpoints.get(&endpoint_key(method, path))
    }

    /// All operations declared on `path`
    pub fn endpoints_for_path(&self, path: &str) -> Vec<&EndpointSchema> {
        self.endpoints.values().filter(|e| e.path == path).collect()
    }

    /// Text listing of endpoints grouped by path
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "API: {} v{}", self.title, self.version);
        if !self.base_url.is_empty() {
            let _ = writeln!(out, "Base URL: {}", self.base_url);
        }
        let _ = writeln!(out, "Endpoints: {}", self.endpoints.len());

        let mut by_path: BTreeMap<&str, Vec<&EndpointSchema>> = BTreeMap::new();
        for endpoint in self.endpoints.values() {
            by_path.entry(endpoint.path.as_str()).or_default().push(endpoint);
        }

        for (path, endpoints) in by_path {
            let _ = writeln!(out, "\n{}", path);
            for endpoint in endpoints {
                let _ = write!(
                    out,
                    "  {:<7} request fields: {}",
                    endpoint.method,
                    endpoint.request_body_fields.len()
                );
                if !endpoint.required_fields.is_empty() {
                    let _ = write!(out, " (required: {})", endpoint.required_fields.join(", "));
                }
                out.push('\n');
            }
        }
        out
    }
}
