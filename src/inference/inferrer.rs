//! Majority-vote type inference over sampled cell values

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::config::InferenceConfig;
use crate::models::SourceColumn;

static DATE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$").unwrap(),
        Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap(),
        Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap(),
    ]
});

const BOOLEAN_TOKENS: [&str; 6] = ["true", "false", "yes", "no", "1", "0"];

/// Coarse semantic type of a tabular column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InferredType {
    Integer,
    Float,
    Date,
    Boolean,
    Varchar,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Integer => "INTEGER",
            InferredType::Float => "FLOAT",
            InferredType::Date => "DATE",
            InferredType::Boolean => "BOOLEAN",
            InferredType::Varchar => "VARCHAR",
        }
    }
}

impl std::fmt::Display for InferredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(value: &str) -> bool {
    value.parse::<f64>().is_ok()
}

fn is_date(value: &str) -> bool {
    DATE_PATTERNS.iter().any(|re| re.is_match(value))
}

fn is_boolean(value: &str) -> bool {
    BOOLEAN_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
}

/// Infers a column type from a sample of its raw values
///
/// Every candidate type is counted independently, so `"1"` counts towards
/// INTEGER, FLOAT and BOOLEAN alike. Candidates are checked in the order
/// INTEGER, FLOAT, DATE, BOOLEAN and the first that reaches the threshold wins.
#[derive(Debug, Clone, Default)]
pub struct TypeInferencer {
    config: InferenceConfig,
}

impl TypeInferencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer the type of `column` from its values
    ///
    /// Empty values are ignored; at most `sample_size` non-empty values are
    /// inspected. A column with no non-empty values is VARCHAR.
    pub fn infer<S: AsRef<str>>(&self, column: &str, values: &[S]) -> InferredType {
        let sample: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .take(self.config.sample_size)
            .collect();

        if sample.is_empty() {
            tracing::debug!("Column '{}' has no sample values, defaulting to VARCHAR", column);
            return InferredType::Varchar;
        }

        let required = sample.len() as f64 * self.config.threshold;
        let count = |pred: fn(&str) -> bool| sample.iter().filter(|v| pred(v)).count() as f64;

        let candidates: [(InferredType, fn(&str) -> bool); 4] = [
            (InferredType::Integer, is_integer),
            (InferredType::Float, is_float),
            (InferredType::Date, is_date),
            (InferredType::Boolean, is_boolean),
        ];

        for (ty, pred) in candidates {
            if count(pred) >= required {
                return ty;
            }
        }
        InferredType::Varchar
    }
}

/// Accumulates the cells of one column while a tabular source is scanned
///
/// Keeps up to `sample_size` non-empty values for inference and remembers
/// whether any cell in the whole column was empty.
#[derive(Debug, Clone)]
pub struct ColumnSampler {
    name: String,
    sample: Vec<String>,
    sample_size: usize,
    saw_empty: bool,
}

impl ColumnSampler {
    pub fn new(name: impl Into<String>, sample_size: usize) -> Self {
        Self {
            name: name.into(),
            sample: Vec::new(),
            sample_size,
            saw_empty: false,
        }
    }

    /// Record one cell; `None` is a missing cell
    pub fn push(&mut self, value: Option<&str>) {
        match value.map(str::trim) {
            None | Some("") => self.saw_empty = true,
            Some(v) => {
                if self.sample.len() < self.sample_size {
                    self.sample.push(v.to_string());
                }
            }
        }
    }

    /// Record a cell outside the sampled rows; only its emptiness is kept
    pub fn observe(&mut self, value: Option<&str>) {
        if value.is_none_or(|v| v.trim().is_empty()) {
            self.saw_empty = true;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the source column
    pub fn finish(self, inferencer: &TypeInferencer) -> SourceColumn {
        let ty = inferencer.infer(&self.name, &self.sample);
        SourceColumn::new(self.name, ty.as_str()).with_nullable(self.saw_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_majority() {
        let inferencer = TypeInferencer::new();
        let values = ["1", "2", "3", "4", "x"];
        assert_eq!(inferencer.infer("id", &values), InferredType::Integer);
    }

    #[test]
    fn test_below_threshold_is_varchar() {
        let inferencer = TypeInferencer::new();
        let values = ["1", "2", "a", "b", "c"];
        assert_eq!(inferencer.infer("code", &values), InferredType::Varchar);
    }

    #[test]
    fn test_mixed_numbers_are_float() {
        let inferencer = TypeInferencer::new();
        let values = ["1", "2.5", "3.75", "4", "0.1"];
        assert_eq!(inferencer.infer("price", &values), InferredType::Float);
    }

    #[test]
    fn test_date_shapes() {
        let inferencer = TypeInferencer::new();
        let values = ["01/02/2023", "2023-05-06", "12-31-1999", "2024-01-01T10:00:00"];
        assert_eq!(inferencer.infer("created", &values), InferredType::Date);
    }

    #[test]
    fn test_boolean_tokens() {
        let inferencer = TypeInferencer::new();
        let values = ["Yes", "no", "TRUE", "false", "yes"];
        assert_eq!(inferencer.infer("active", &values), InferredType::Boolean);
    }

    #[test]
    fn test_zero_one_prefers_integer() {
        let inferencer = TypeInferencer::new();
        assert_eq!(inferencer.infer("flag", &["0", "1", "1"]), InferredType::Integer);
    }

    #[test]
    fn test_empty_values_ignored() {
        let inferencer = TypeInferencer::new();
        assert_eq!(inferencer.infer("x", &["", "  ", "7"]), InferredType::Integer);
        assert_eq!(inferencer.infer::<&str>("x", &[]), InferredType::Varchar);
    }

    #[test]
    fn test_sample_size_limits_inspection() {
        let config = InferenceConfig::builder().sample_size(4).build();
        let inferencer = TypeInferencer::with_config(config);
        let values = ["1", "2", "3", "4", "a", "b", "c", "d"];
        assert_eq!(inferencer.infer("n", &values), InferredType::Integer);
    }

    #[test]
    fn test_sampler_tracks_nullability() {
        let inferencer = TypeInferencer::new();
        let mut sampler = ColumnSampler::new("age", 100);
        sampler.push(Some("31"));
        sampler.push(None);
        sampler.push(Some("44"));
        let column = sampler.finish(&inferencer);
        assert_eq!(column.type_name, "INTEGER");
        assert!(column.nullable);

        let mut sampler = ColumnSampler::new("age", 100);
        sampler.push(Some("31"));
        assert!(!sampler.finish(&inferencer).nullable);
    }
}
