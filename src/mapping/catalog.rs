//! Destination table catalog consumed by the heuristic matcher

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{MappingError, MappingResult};
use crate::models::ApiSchema;

/// One destination entity and its writable fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// REST path that creates records of this table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl DestinationTable {
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: Vec<S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Destination tables, looked up by case-insensitive name
///
/// JSON form: `{"tables": [{"name": "Customer", "columns": ["id", "name"]}]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationCatalog {
    #[serde(default)]
    pub tables: Vec<DestinationTable>,
}

impl DestinationCatalog {
    pub fn new(tables: Vec<DestinationTable>) -> Self {
        Self { tables }
    }

    /// One table per POST endpoint, named after the last non-parameter path
    /// segment; columns are the request body fields
    pub fn from_api_schema(api: &ApiSchema) -> Self {
        let mut catalog = Self::default();
        for endpoint in api.endpoints.values().filter(|e| e.method == "POST") {
            let Some(name) = endpoint
                .path
                .split('/')
                .rev()
                .find(|s| !s.is_empty() && !s.starts_with('{'))
            else {
                continue;
            };
            if catalog.get_table(name).is_some() {
                tracing::debug!("Skipping duplicate destination table {}", name);
                continue;
            }
            let columns = endpoint.request_body_fields.keys().cloned().collect();
            catalog.tables.push(DestinationTable {
                name: name.to_string(),
                columns,
                endpoint: Some(endpoint.path.clone()),
            });
        }
        catalog
    }

    pub fn from_json_str(json: &str) -> MappingResult<Self> {
        serde_json::from_str(json).map_err(|e| MappingError::CatalogParse(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> MappingResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn get_table(&self, name: &str) -> Option<&DestinationTable> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
