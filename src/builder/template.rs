//! `${...}` template evaluation over a row context

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::transformers::stringify;

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());
static CONDITIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{if\s+([^?]+)\s*\?\s*([^:]+)\s*:\s*([^}]+)\}").unwrap()
});

/// Truthiness of a context value: `null`, `false`, zero and empty values are
/// false
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Substitutes `${name}` and `${if cond ? a : b}` expressions
///
/// Conditionals are rewritten first, so variables inside the chosen branch
/// are substituted afterwards. A missing variable renders as the empty
/// string; a missing condition key is false.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    context: Map<String, Value>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: Map<String, Value>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Replace the whole context
    pub fn set_context(&mut self, context: Map<String, Value>) {
        self.context = context;
    }

    /// Insert or overwrite context entries
    pub fn update_context<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in entries {
            self.context.insert(key.into(), value);
        }
    }

    pub fn evaluate(&self, template: &str) -> String {
        let template = self.evaluate_conditionals(template);
        self.evaluate_variables(&template)
    }

    fn evaluate_conditionals(&self, template: &str) -> String {
        CONDITIONAL_RE
            .replace_all(template, |caps: &Captures| {
                let condition = caps[1].trim();
                let branch = if self.context.get(condition).is_some_and(truthy) {
                    &caps[2]
                } else {
                    &caps[3]
                };
                branch.trim().to_string()
            })
            .into_owned()
    }

    fn evaluate_variables(&self, template: &str) -> String {
        VARIABLE_RE
            .replace_all(template, |caps: &Captures| {
                let name = caps[1].trim();
                match self.context.get(name) {
                    Some(value) if !value.is_null() => stringify(value),
                    _ => {
                        tracing::warn!("Variable not found in context: {}", name);
                        String::new()
                    }
                }
            })
            .into_owned()
    }

    /// Escape quotes, newlines and tabs for embedding in API strings
    pub fn escape_string(value: &str) -> String {
        value
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\t', "\\t")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine(context: Value) -> TemplateEngine {
        match context {
            Value::Object(map) => TemplateEngine::with_context(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_variables() {
        let engine = engine(json!({"nome": "Mesa", "peso": 2.5}));
        assert_eq!(engine.evaluate("${nome} (${ peso } kg)"), "Mesa (2.5 kg)");
        assert_eq!(engine.evaluate("x${missing}y"), "xy");
        assert_eq!(engine.evaluate("plain"), "plain");
    }

    #[test]
    fn test_conditionals_before_variables() {
        let engine = engine(json!({"ativo": true, "nome": "Mesa", "zero": 0}));
        assert_eq!(engine.evaluate("${if ativo ? ${nome} : inativo}"), "Mesa");
        assert_eq!(engine.evaluate("${if zero ? yes : no}"), "no");
        assert_eq!(engine.evaluate("${if absent ? yes : no}"), "no");
    }

    #[test]
    fn test_context_updates() {
        let mut engine = TemplateEngine::new();
        engine.update_context([("a", json!(1))]);
        engine.update_context([("b".to_string(), json!("two"))]);
        assert_eq!(engine.evaluate("${a}-${b}"), "1-two");

        engine.set_context(Map::new());
        assert_eq!(engine.evaluate("${a}"), "");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(
            TemplateEngine::escape_string("say \"hi\"\n\tbye"),
            "say \\\"hi\\\"\\n\\tbye"
        );
    }
}
