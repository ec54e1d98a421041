//! Configuration for heuristic matching

use serde::{Deserialize, Serialize};

/// Thresholds and confidence tiers used by the matchers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Minimum similarity for a fuzzy table match (0.0-1.0)
    pub table_threshold: f64,
    /// Minimum similarity for a fuzzy column match (0.0-1.0)
    pub column_threshold: f64,
    /// Minimum similarity for a fuzzy endpoint match (0.0-1.0)
    pub endpoint_threshold: f64,
    /// Minimum similarity for an endpoint suggestion (0.0-1.0)
    pub suggestion_threshold: f64,
    /// Confidence of a rule whose table matched exactly or by alias
    pub strong_confidence: f64,
    /// Confidence of a rule with a fuzzy table match or a guessed field
    pub weak_confidence: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            table_threshold: 0.7,
            column_threshold: 0.75,
            endpoint_threshold: 0.7,
            suggestion_threshold: 0.6,
            strong_confidence: 0.9,
            weak_confidence: 0.6,
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_threshold(mut self, threshold: f64) -> Self {
        self.table_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_column_threshold(mut self, threshold: f64) -> Self {
        self.column_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_endpoint_threshold(mut self, threshold: f64) -> Self {
        self.endpoint_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_suggestion_threshold(mut self, threshold: f64) -> Self {
        self.suggestion_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set both confidence tiers
    pub fn with_confidences(mut self, strong: f64, weak: f64) -> Self {
        self.strong_confidence = strong.clamp(0.0, 1.0);
        self.weak_confidence = weak.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.table_threshold, 0.7);
        assert_eq!(config.column_threshold, 0.75);
        assert_eq!(config.strong_confidence, 0.9);
        assert_eq!(config.weak_confidence, 0.6);
    }

    #[test]
    fn test_builder_clamps() {
        let config = MatcherConfig::new()
            .with_table_threshold(1.5)
            .with_confidences(-1.0, 0.5);
        assert_eq!(config.table_threshold, 1.0);
        assert_eq!(config.strong_confidence, 0.0);
        assert_eq!(config.weak_confidence, 0.5);
    }
}
