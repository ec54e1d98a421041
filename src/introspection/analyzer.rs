//! OpenAPI document analysis
//!
//! Walks `paths` and `components.schemas` of an OpenAPI 3.x document and
//! builds an [`ApiSchema`] with typed field trees for every operation.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use super::error::{IntrospectionError, IntrospectionResult};
use crate::models::{ApiSchema, EndpointField, EndpointSchema, FieldType};

/// HTTP methods that produce endpoints
pub const HTTP_METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Response status codes consulted for response fields, in order
const RESPONSE_CODES: [&str; 3] = ["200", "201", "default"];

const JSON_CONTENT: &str = "application/json";

/// Refs currently being resolved on the active path
type InProgress = HashSet<String>;

/// Builds an [`ApiSchema`] from a decoded OpenAPI document
///
/// `$ref` chains are followed through `components.schemas`. A reference that
/// is re-entered while it is still being resolved is treated as unresolvable,
/// so self-referential schemas end in an `unknown` field instead of
/// recursing forever.
#[derive(Debug, Default)]
pub struct DestinationSchemaAnalyzer {
    definitions: HashMap<String, Value>,
}

impl DestinationSchemaAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze an OpenAPI document
    pub fn analyze(&mut self, spec: &Value) -> IntrospectionResult<ApiSchema> {
        let root = spec.as_object().ok_or_else(|| {
            IntrospectionError::InvalidDocument("OpenAPI spec must be an object".to_string())
        })?;

        let info = root.get("info");
        let title = info
            .and_then(|i| i.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown API");
        let version = info
            .and_then(|i| i.get("version"))
            .and_then(Value::as_str)
            .unwrap_or("1.0.0");

        let mut api = ApiSchema::new(title, version);
        api.base_url = root
            .get("servers")
            .and_then(Value::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        self.definitions = spec
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .map(|schemas| {
                schemas
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(paths) = root.get("paths").and_then(Value::as_object) {
            for (path, item) in paths {
                for endpoint in self.analyze_path(spec, path, item) {
                    api.endpoints.insert(endpoint.key(), endpoint);
                }
            }
        }

        api.definitions = std::mem::take(&mut self.definitions);
        tracing::info!("Analyzed {} endpoints", api.endpoints.len());
        Ok(api)
    }

    fn analyze_path(&self, spec: &Value, path: &str, item: &Value) -> Vec<EndpointSchema> {
        let Some(item) = item.as_object() else {
            tracing::warn!("Skipping path {}: path item is not an object", path);
            return Vec::new();
        };

        let mut endpoints = Vec::new();
        for (method, operation) in item {
            let method = method.to_lowercase();
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let Some(operation) = operation.as_object() else {
                continue;
            };
            endpoints.push(self.analyze_operation(spec, path, &method, operation));
        }
        endpoints
    }

    fn analyze_operation(
        &self,
        spec: &Value,
        path: &str,
        method: &str,
        operation: &Map<String, Value>,
    ) -> EndpointSchema {
        let mut endpoint = EndpointSchema::new(path, method);
        endpoint.summary = operation
            .get("summary")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(schema) = operation
            .get("requestBody")
            .map(|body| resolve_document_ref(spec, body))
            .and_then(json_schema)
        {
            let mut in_progress = InProgress::new();
            endpoint.request_body_fields = self.extract_fields(schema, &mut in_progress);
            endpoint.required_fields = endpoint
                .request_body_fields
                .values()
                .filter(|f| f.required)
                .map(|f| f.name.clone())
                .collect();
        }

        let response_schema = operation
            .get("responses")
            .and_then(Value::as_object)
            .and_then(|responses| RESPONSE_CODES.iter().find_map(|code| responses.get(*code)))
            .and_then(|response| json_schema(resolve_document_ref(spec, response)));
        if let Some(schema) = response_schema {
            let mut in_progress = InProgress::new();
            endpoint.response_fields = self.extract_fields(schema, &mut in_progress);
        }

        endpoint
    }

    /// Fields declared by an object-like schema
    fn extract_fields(
        &self,
        schema: &Value,
        in_progress: &mut InProgress,
    ) -> BTreeMap<String, EndpointField> {
        let mut fields = BTreeMap::new();

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            if let Some(target) = self.enter_ref(reference, in_progress) {
                fields = self.extract_fields(&target, in_progress);
                in_progress.remove(reference);
            }
            return fields;
        }

        if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
            for member in members {
                fields.extend(self.extract_fields(member, in_progress));
            }
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            let required: HashSet<&str> = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            for (name, property) in properties {
                let is_required = required.contains(name.as_str());
                let field = self.create_field(name, property, is_required, in_progress);
                fields.insert(name.clone(), field);
            }
        }

        fields
    }

    fn create_field(
        &self,
        name: &str,
        schema: &Value,
        required: bool,
        in_progress: &mut InProgress,
    ) -> EndpointField {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            let Some(target) = self.enter_ref(reference, in_progress) else {
                let mut field = EndpointField::unresolved(name);
                field.required = required;
                return field;
            };
            let field = self.create_field(name, &target, required, in_progress);
            in_progress.remove(reference);
            return field;
        }

        let mut field = EndpointField::new(name, schema_type(schema));
        field.required = required;
        field.format = string_keyword(schema, "format");
        field.description = string_keyword(schema, "description");
        field.pattern = string_keyword(schema, "pattern");
        field.min_length = schema.get("minLength").and_then(Value::as_u64);
        field.max_length = schema.get("maxLength").and_then(Value::as_u64);
        field.enum_values = schema
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        match field.field_type {
            FieldType::Object => {
                field.nested_fields = self.extract_fields(schema, in_progress);
            }
            FieldType::Array => {
                if let Some(items) = schema
                    .get("items")
                    .filter(|i| i.as_object().is_some_and(|o| !o.is_empty()))
                {
                    let item_name = format!("{}_item", name);
                    let item = self.create_field(&item_name, items, false, in_progress);
                    field.array_item_type = Some(Box::new(item));
                }
            }
            _ => {}
        }

        field
    }

    /// Mark `reference` as in progress and return its target
    ///
    /// Returns `None`, leaving the set untouched, for cycles and unknown
    /// targets.
    fn enter_ref(&self, reference: &str, in_progress: &mut InProgress) -> Option<Value> {
        if in_progress.contains(reference) {
            tracing::warn!("Circular reference detected: {}", reference);
            return None;
        }
        let Some(target) = self.resolve_ref(reference) else {
            tracing::warn!("Could not resolve reference: {}", reference);
            return None;
        };
        in_progress.insert(reference.to_string());
        Some(target)
    }

    /// Resolve `#/components/schemas/...` against the definitions table
    fn resolve_ref(&self, reference: &str) -> Option<Value> {
        let pointer = reference.strip_prefix("#/")?;
        let mut segments = pointer.split('/').skip(2).map(unescape_pointer);

        let name = segments.next()?;
        let mut current = self.definitions.get(&name)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(&segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }
}

fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Follow a document-level `$ref` on a request body or response object
fn resolve_document_ref<'a>(spec: &'a Value, value: &'a Value) -> &'a Value {
    value
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix('#'))
        .and_then(|pointer| spec.pointer(pointer))
        .unwrap_or(value)
}

/// The JSON media type schema of a request body or response
fn json_schema(body: &Value) -> Option<&Value> {
    body.get("content")?.get(JSON_CONTENT)?.get("schema")
}

/// Declared type, defaulting to `object`
///
/// OpenAPI 3.1 type arrays use their first non-null entry.
fn schema_type(schema: &Value) -> FieldType {
    match schema.get("type") {
        Some(Value::String(ty)) => FieldType::from_openapi(ty),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null")
            .map_or(FieldType::Object, FieldType::from_openapi),
        _ => FieldType::Object,
    }
}

fn string_keyword(schema: &Value, key: &str) -> Option<String> {
    schema.get(key).and_then(Value::as_str).map(str::to_string)
}
