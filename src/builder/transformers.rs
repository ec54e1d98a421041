//! Named value transformers
//!
//! A [`TransformerRegistry`] maps names such as `UPPERCASE` or `FORMAT_CPF` to
//! functions over JSON values. Field builders borrow a registry, so tests and
//! callers can install their own transformers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use super::error::TransformError;

/// A transformer function
pub type TransformFn = Arc<dyn Fn(&Value) -> Result<Value, TransformError> + Send + Sync>;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Render a value the way it appears in payload text
///
/// Strings are unquoted, `null` is empty and containers are JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn map_str(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    }
}

fn digits(value: &Value) -> String {
    stringify(value).chars().filter(char::is_ascii_digit).collect()
}

fn format_cpf(value: &Value) -> Result<Value, TransformError> {
    let clean = digits(value);
    if clean.len() != 11 {
        return Ok(value.clone());
    }
    Ok(Value::String(format!(
        "{}.{}.{}-{}",
        &clean[..3],
        &clean[3..6],
        &clean[6..9],
        &clean[9..]
    )))
}

fn format_cnpj(value: &Value) -> Result<Value, TransformError> {
    let clean = digits(value);
    if clean.len() != 14 {
        return Ok(value.clone());
    }
    Ok(Value::String(format!(
        "{}.{}.{}/{}-{}",
        &clean[..2],
        &clean[2..5],
        &clean[5..8],
        &clean[8..12],
        &clean[12..]
    )))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        })
}

fn format_date(value: &Value) -> Result<Value, TransformError> {
    let text = stringify(value);
    let text = text.trim();
    if text.is_empty() {
        return Ok(value.clone());
    }
    parse_date(text)
        .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
        .ok_or_else(|| TransformError::new("FORMAT_DATE", text, "unrecognized date"))
}

fn to_integer(value: &Value) -> Result<Value, TransformError> {
    let fail = |reason: &str| TransformError::new("TO_INTEGER", stringify(value), reason);
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(Value::from)
            .ok_or_else(|| fail("out of range")),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .map(Value::from)
                .ok_or_else(|| fail("not a number"))
        }
        Value::Null => Ok(Value::Null),
        _ => Err(fail("not a scalar")),
    }
}

fn to_float(value: &Value) -> Result<Value, TransformError> {
    let fail = |reason: &str| TransformError::new("TO_FLOAT", stringify(value), reason);
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let s = if s.contains(',') && !s.contains('.') {
                s.replace(',', ".")
            } else {
                s.to_string()
            };
            s.parse::<f64>().ok()
        }
        Value::Null => return Ok(Value::Null),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| fail("not a number"))
}

fn to_boolean(value: &Value) -> Result<Value, TransformError> {
    match value {
        Value::Bool(_) | Value::Null => Ok(value.clone()),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "sim" | "s" | "y" => Ok(Value::Bool(true)),
            "false" | "no" | "0" | "nao" | "não" | "n" | "" => Ok(Value::Bool(false)),
            _ => Err(TransformError::new("TO_BOOLEAN", s.as_str(), "not a boolean token")),
        },
        other => Err(TransformError::new("TO_BOOLEAN", other.to_string(), "not a scalar")),
    }
}

fn wrap<F>(f: F) -> TransformFn
where
    F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Name to transformer lookup table
#[derive(Clone)]
pub struct TransformerRegistry {
    transformers: HashMap<String, TransformFn>,
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("NONE", |v| Ok(v.clone()))
            .register("UPPERCASE", |v| Ok(map_str(v, str::to_uppercase)))
            .register("LOWERCASE", |v| Ok(map_str(v, str::to_lowercase)))
            .register("TRIM", |v| Ok(map_str(v, |s| s.trim().to_string())))
            .register("FORMAT_CPF", format_cpf)
            .register("FORMAT_CNPJ", format_cnpj)
            .register("FORMAT_DATE", format_date)
            .register("TO_INTEGER", to_integer)
            .register("TO_FLOAT", to_float)
            .register("TO_BOOLEAN", to_boolean)
            .register("TO_STRING", |v| {
                Ok(match v {
                    Value::Null => Value::Null,
                    other => Value::String(stringify(other)),
                })
            });
        registry
    }
}

impl TransformerRegistry {
    /// Registry with the built-in transformers
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no transformers
    pub fn empty() -> Self {
        Self {
            transformers: HashMap::new(),
        }
    }

    /// Add or replace a transformer
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.transformers.insert(name.into(), wrap(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<&TransformFn> {
        self.transformers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transformers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(name: &str, value: Value) -> Result<Value, TransformError> {
        let registry = TransformerRegistry::new();
        (registry.get(name).unwrap())(&value)
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!(2.5)), "2.5");
        assert_eq!(stringify(&json!(10)), "10");
        assert_eq!(stringify(&json!("kg")), "kg");
        assert_eq!(stringify(&Value::Null), "");
        assert_eq!(stringify(&json!(true)), "true");
    }

    #[test]
    fn test_text_transformers() {
        assert_eq!(apply("UPPERCASE", json!("mesa")).unwrap(), json!("MESA"));
        assert_eq!(apply("LOWERCASE", json!("MESA")).unwrap(), json!("mesa"));
        assert_eq!(apply("TRIM", json!("  a ")).unwrap(), json!("a"));
        assert_eq!(apply("UPPERCASE", json!(5)).unwrap(), json!(5));
    }

    #[test]
    fn test_document_numbers() {
        assert_eq!(apply("FORMAT_CPF", json!("12345678901")).unwrap(), json!("123.456.789-01"));
        assert_eq!(
            apply("FORMAT_CNPJ", json!("12.345.678/0001-95")).unwrap(),
            json!("12.345.678/0001-95")
        );
        assert_eq!(
            apply("FORMAT_CNPJ", json!("12345678000195")).unwrap(),
            json!("12.345.678/0001-95")
        );
        assert_eq!(apply("FORMAT_CPF", json!("123")).unwrap(), json!("123"));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(apply("FORMAT_DATE", json!("31/12/2023")).unwrap(), json!("2023-12-31"));
        assert_eq!(
            apply("FORMAT_DATE", json!("2024-02-29T10:30:00Z")).unwrap(),
            json!("2024-02-29")
        );
        assert_eq!(
            apply("FORMAT_DATE", json!("2024-01-05 08:00:00")).unwrap(),
            json!("2024-01-05")
        );
        assert!(apply("FORMAT_DATE", json!("yesterday")).is_err());
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(apply("TO_INTEGER", json!(" 42 ")).unwrap(), json!(42));
        assert_eq!(apply("TO_INTEGER", json!(3.9)).unwrap(), json!(3));
        assert!(apply("TO_INTEGER", json!("abc")).is_err());
        assert_eq!(apply("TO_FLOAT", json!("2,5")).unwrap(), json!(2.5));
        assert_eq!(apply("TO_BOOLEAN", json!("Sim")).unwrap(), json!(true));
        assert_eq!(apply("TO_BOOLEAN", json!(0)).unwrap(), json!(false));
        assert!(apply("TO_BOOLEAN", json!("maybe")).is_err());
        assert_eq!(apply("TO_STRING", json!(7)).unwrap(), json!("7"));
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = TransformerRegistry::empty();
        registry.register("DOUBLE", |v| {
            Ok(json!(v.as_i64().unwrap_or_default() * 2))
        });
        assert_eq!(registry.names(), vec!["DOUBLE"]);
        assert!(!registry.contains("NONE"));
        assert_eq!((registry.get("DOUBLE").unwrap())(&json!(4)).unwrap(), json!(8));
    }
}
