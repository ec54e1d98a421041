//! Construction of single payload fields

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use super::error::{BuildError, BuildResult};
use super::template::TemplateEngine;
use super::transformers::{TransformerRegistry, stringify};
use crate::models::{AttributeMapping, FieldKind, FieldMapping};

/// One source record, keyed by column name
pub type Row = Map<String, Value>;

/// `{logical_table: {source_id: destination_id}}`
pub type IdMappings = HashMap<String, HashMap<String, Value>>;

/// Builds destination field values from one source row
///
/// Transformers are looked up by name in the borrowed registry. An unknown
/// name or a failing transformer leaves the value unchanged.
#[derive(Debug, Clone, Copy)]
pub struct FieldBuilder<'a> {
    transformers: &'a TransformerRegistry,
}

impl<'a> FieldBuilder<'a> {
    pub fn new(transformers: &'a TransformerRegistry) -> Self {
        Self { transformers }
    }

    /// Value of `mapping.target` for `row`
    ///
    /// `Ok(None)` means the field is omitted from the payload. An id that
    /// cannot be remapped fails the row.
    pub fn build_field(
        &self,
        mapping: &FieldMapping,
        row: &Row,
        id_mappings: &IdMappings,
    ) -> BuildResult<Option<Value>> {
        if mapping.kind == FieldKind::Attribute {
            let attributes = self.build_attributes(&mapping.attribute_mappings, row);
            return Ok((!attributes.is_empty()).then_some(Value::Array(attributes)));
        }

        let source_value = match &mapping.template {
            Some(template) => {
                Some(Value::String(TemplateEngine::with_context(row.clone()).evaluate(template)))
            }
            None => row.get(&mapping.source).filter(|v| !v.is_null()).cloned(),
        };
        let Some(mut value) = source_value.or_else(|| {
            mapping
                .default_value
                .as_ref()
                .filter(|v| !v.is_null())
                .cloned()
        }) else {
            return Ok(None);
        };

        if let Some(name) = &mapping.transformer {
            value = self.apply_transformer(value, name);
        }
        if value.is_null() {
            return Ok(None);
        }

        if let Some(id_table) = &mapping.id_table {
            value = remap_id(id_table, &value, id_mappings)?;
            if value.is_null() {
                return Ok(None);
            }
        }

        Ok(Some(match mapping.kind {
            FieldKind::Nested => json!({ "id": value }),
            FieldKind::Array => json!([{ "id": value }]),
            FieldKind::Direct | FieldKind::Attribute => value,
        }))
    }

    /// `{"attribute": {"id", "name"}, "value"}` entries for the mappings that
    /// produce a value
    pub fn build_attributes(&self, mappings: &[AttributeMapping], row: &Row) -> Vec<Value> {
        let mut attributes = Vec::new();

        for mapping in mappings {
            let value = match row.get(&mapping.source_column).filter(|v| !v.is_null()) {
                Some(value) => value.clone(),
                None if mapping.skip_if_null => continue,
                None => Value::String(String::new()),
            };

            let value = match &mapping.transformer {
                Some(name) => self.apply_transformer(value, name),
                None => value,
            };

            let rendered = match &mapping.format_string {
                Some(format) => format.replace("{value}", &stringify(&value)),
                None => stringify(&value),
            };

            attributes.push(json!({
                "attribute": {
                    "id": mapping.attribute_id,
                    "name": mapping.attribute_name,
                },
                "value": rendered,
            }));
        }

        attributes
    }

    fn apply_transformer(&self, value: Value, name: &str) -> Value {
        let Some(transformer) = self.transformers.get(name) else {
            tracing::warn!("Unknown transformer: {}", name);
            return value;
        };
        match transformer(&value) {
            Ok(transformed) => transformed,
            Err(e) => {
                tracing::error!("Error applying transformer {}: {}", name, e);
                value
            }
        }
    }
}

fn remap_id(id_table: &str, value: &Value, id_mappings: &IdMappings) -> BuildResult<Value> {
    let key = stringify(value);
    id_mappings
        .get(id_table)
        .and_then(|ids| ids.get(&key))
        .cloned()
        .ok_or_else(|| BuildError::UnmappedReference {
            id_table: id_table.to_string(),
            value: key,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_direct_nested_array() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let data = row(json!({"nome": "mesa", "marca": 7}));
        let ids = IdMappings::new();

        let direct = FieldMapping::direct("nome", "name").with_transformer("UPPERCASE");
        assert_eq!(builder.build_field(&direct, &data, &ids).unwrap(), Some(json!("MESA")));

        let nested = FieldMapping::new("marca", "brand", FieldKind::Nested);
        assert_eq!(
            builder.build_field(&nested, &data, &ids).unwrap(),
            Some(json!({"id": 7}))
        );

        let array = FieldMapping::new("marca", "brands", FieldKind::Array);
        assert_eq!(
            builder.build_field(&array, &data, &ids).unwrap(),
            Some(json!([{"id": 7}]))
        );
    }

    #[test]
    fn test_missing_value_and_default() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let data = row(json!({"ativo": null}));
        let ids = IdMappings::new();

        let plain = FieldMapping::direct("ativo", "active");
        assert_eq!(builder.build_field(&plain, &data, &ids).unwrap(), None);

        let defaulted = FieldMapping::direct("ativo", "active").with_default(json!(true));
        assert_eq!(builder.build_field(&defaulted, &data, &ids).unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_unknown_and_failing_transformers_pass_through() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let data = row(json!({"qtd": "abc"}));
        let ids = IdMappings::new();

        let unknown = FieldMapping::direct("qtd", "quantity").with_transformer("NOPE");
        assert_eq!(builder.build_field(&unknown, &data, &ids).unwrap(), Some(json!("abc")));

        let failing = FieldMapping::direct("qtd", "quantity").with_transformer("TO_INTEGER");
        assert_eq!(builder.build_field(&failing, &data, &ids).unwrap(), Some(json!("abc")));
    }

    #[test]
    fn test_attribute_entries() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let data = row(json!({"peso": 2.5, "altura": null}));

        let mappings = vec![
            AttributeMapping::new("peso")
                .with_attribute(1, "Peso")
                .with_format("{value} kg"),
            AttributeMapping::new("altura").with_attribute(2, "Altura"),
            AttributeMapping::new("largura")
                .with_attribute(3, "Largura")
                .with_skip_if_null(false),
        ];
        let attributes = builder.build_attributes(&mappings, &data);
        assert_eq!(
            Value::Array(attributes),
            json!([
                {"attribute": {"id": 1, "name": "Peso"}, "value": "2.5 kg"},
                {"attribute": {"id": 3, "name": "Largura"}, "value": ""}
            ])
        );
    }

    #[test]
    fn test_empty_attributes_omit_field() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let mapping = FieldMapping::attributes("attributes", vec![AttributeMapping::new("peso")]);
        let result = builder
            .build_field(&mapping, &Row::new(), &IdMappings::new())
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let data = row(json!({"peso": 2.5, "cor": "azul"}));
        let mapping = FieldMapping::attributes(
            "attributes",
            vec![
                AttributeMapping::new("peso").with_attribute(1, "Peso"),
                AttributeMapping::new("cor")
                    .with_attribute(2, "Cor")
                    .with_transformer("UPPERCASE"),
            ],
        );

        let first = builder.build_field(&mapping, &data, &IdMappings::new()).unwrap();
        let second = builder.build_field(&mapping, &data, &IdMappings::new()).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_id_remapping() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let mut ids = IdMappings::new();
        ids.entry("marcas".into())
            .or_default()
            .insert("2".into(), json!(100));

        let mapping =
            FieldMapping::new("id_marca", "brand", FieldKind::Nested).with_id_table("marcas");
        let mapped = builder
            .build_field(&mapping, &row(json!({"id_marca": 2})), &ids)
            .unwrap();
        assert_eq!(mapped, Some(json!({"id": 100})));

        let err = builder
            .build_field(&mapping, &row(json!({"id_marca": 9})), &ids)
            .unwrap_err();
        assert!(matches!(err, BuildError::UnmappedReference { ref value, .. } if value == "9"));
    }

    #[test]
    fn test_template_field() {
        let registry = TransformerRegistry::new();
        let builder = FieldBuilder::new(&registry);
        let mapping = FieldMapping::direct("", "description").with_template("${nome} - ${cor}");
        let value = builder
            .build_field(&mapping, &row(json!({"nome": "Mesa", "cor": "azul"})), &IdMappings::new())
            .unwrap();
        assert_eq!(value, Some(json!("Mesa - azul")));
    }
}
