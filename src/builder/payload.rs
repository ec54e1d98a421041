//! Payload assembly for whole rows, batches and tables

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{BuildError, BuildResult, TransformError};
use super::field::{FieldBuilder, Row};
use super::transformers::TransformerRegistry;
use crate::models::PayloadConfig;

/// A row that could not be built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Position in the input rows
    pub index: usize,
    pub reason: String,
}

/// Payloads of a batch in input order, plus the rows that were skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub payloads: Vec<Row>,
    pub skipped: Vec<SkippedRow>,
}

impl BatchOutcome {
    pub fn total_rows(&self) -> usize {
        self.payloads.len() + self.skipped.len()
    }
}

/// Builds destination payloads from source rows
///
/// # Example
///
/// ```rust
/// use erp_migration_sdk::builder::PayloadBuilder;
/// use erp_migration_sdk::models::{AttributeMapping, FieldMapping, PayloadConfig};
/// use serde_json::json;
///
/// let config = PayloadConfig::new("PRODUTOS", "/v1/catalog/products").with_mappings(vec![
///     FieldMapping::direct("nome", "name"),
///     FieldMapping::attributes(
///         "attributes",
///         vec![AttributeMapping::new("peso").with_attribute(1, "Peso").with_format("{value} kg")],
///     ),
/// ]);
/// let row = json!({"nome": "Mesa", "peso": 2.5});
///
/// let payload = PayloadBuilder::new()
///     .build(&config, row.as_object().unwrap())
///     .unwrap();
/// assert_eq!(payload["attributes"][0]["value"], "2.5 kg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    transformers: TransformerRegistry,
}

impl PayloadBuilder {
    /// Builder with the built-in transformers
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transformers(transformers: TransformerRegistry) -> Self {
        Self { transformers }
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    /// Register a custom transformer
    pub fn add_transformer<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.transformers.register(name, f);
    }

    /// Build one payload
    ///
    /// Mappings are applied in order, so a later mapping overwrites an
    /// earlier one with the same target. Omitted fields never appear as
    /// `null`.
    pub fn build(&self, config: &PayloadConfig, row: &Row) -> BuildResult<Row> {
        let fields = FieldBuilder::new(&self.transformers);
        let mut payload = Row::new();

        for mapping in &config.mappings {
            if let Some(value) = fields.build_field(mapping, row, &config.id_mappings)? {
                payload.insert(mapping.target.clone(), value);
            }
        }

        if config.validate_required {
            let missing: Vec<String> = config
                .required_fields
                .iter()
                .filter(|f| !payload.contains_key(f.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingRequiredFields {
                    table: config.table_name.clone(),
                    fields: missing,
                });
            }
        }

        Ok(payload)
    }

    /// Build every row, skipping the ones that fail
    pub fn build_batch(&self, config: &PayloadConfig, rows: &[Row]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (index, row) in rows.iter().enumerate() {
            match self.build(config, row) {
                Ok(payload) => outcome.payloads.push(payload),
                Err(e) => {
                    tracing::error!("Error building payload for row {}: {}", index, e);
                    outcome.skipped.push(SkippedRow {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Built {} payloads from {} rows ({} skipped)",
            outcome.payloads.len(),
            rows.len(),
            outcome.skipped.len()
        );
        outcome
    }

    /// Build the rows of every configured table
    ///
    /// Rows are looked up by table name, exactly first and then ignoring
    /// case. Tables without rows produce an empty outcome.
    pub fn build_tables(
        &self,
        configs: &[PayloadConfig],
        data: &HashMap<String, Vec<Row>>,
    ) -> BTreeMap<String, BatchOutcome> {
        let mut results = BTreeMap::new();

        for config in configs {
            let rows = data.get(&config.table_name).or_else(|| {
                data.iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&config.table_name))
                    .map(|(_, rows)| rows)
            });
            let outcome = match rows {
                Some(rows) => self.build_batch(config, rows),
                None => {
                    tracing::debug!("No rows for table {}", config.table_name);
                    BatchOutcome::default()
                }
            };
            results.insert(config.table_name.clone(), outcome);
        }

        results
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<PayloadConfig>),
    One(Box<PayloadConfig>),
}

impl From<OneOrMany> for Vec<PayloadConfig> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Many(configs) => configs,
            OneOrMany::One(config) => vec![*config],
        }
    }
}

impl PayloadConfig {
    pub fn from_yaml_str(yaml: &str) -> BuildResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| BuildError::ConfigParse(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> BuildResult<Self> {
        serde_json::from_str(json).map_err(|e| BuildError::ConfigParse(e.to_string()))
    }
}

/// Load one configuration or a list of them from a YAML or JSON file
///
/// Files ending in `.json` are read as JSON, everything else as YAML.
pub fn load_payload_configs(path: impl AsRef<Path>) -> BuildResult<Vec<PayloadConfig>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| BuildError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let parsed: OneOrMany = if is_json {
        serde_json::from_str(&text).map_err(|e| BuildError::ConfigParse(e.to_string()))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| BuildError::ConfigParse(e.to_string()))?
    };

    let configs: Vec<PayloadConfig> = parsed.into();
    tracing::debug!("Loaded {} payload config(s) from {}", configs.len(), path.display());
    Ok(configs)
}
