//! Configuration for column type inference

use serde::{Deserialize, Serialize};

/// Configuration for column type inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Maximum number of non-empty values inspected per column
    pub sample_size: usize,

    /// Share of sampled values (0.0 - 1.0) that must parse as a type for it
    /// to be selected
    pub threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            threshold: 0.8,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the per-column sample size
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size.max(1);
        self
    }

    /// Set the majority threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.sample_size, 100);
        assert!((config.threshold - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_clamps() {
        let config = InferenceConfig::builder()
            .sample_size(0)
            .threshold(1.5)
            .build();
        assert_eq!(config.sample_size, 1);
        assert_eq!(config.threshold, 1.0);
    }
}
