//! Application configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! | Variable               | Setting             |
//! |------------------------|---------------------|
//! | `ERP_API_URL`          | `api.base_url`      |
//! | `ERP_API_KEY`          | `api.api_key`       |
//! | `ERP_API_USER`         | `api.username`      |
//! | `ERP_API_PASSWORD`     | `api.password`      |
//! | `ERP_API_TIMEOUT`      | `api.timeout_secs`  |
//! | `ERP_BATCH_SIZE`       | `api.batch_size`    |
//! | `MIGRATION_BACKUP_DIR` | `backup_dir`        |
//! | `MIGRATION_OUTPUT_DIR` | `output_dir`        |
//! | `MIGRATION_CONFIG_DIR` | `config_dir`        |
//! | `MIGRATION_CACHE_DIR`  | `cache_dir`         |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::introspection::IntrospectorConfig;

/// Error loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Credentials sent with API requests
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Destination API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    pub batch_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            username: None,
            password: None,
            timeout_secs: 60,
            batch_size: 500,
        }
    }
}

impl ApiConfig {
    /// API key wins over basic auth; `None` when neither is set
    pub fn credentials(&self) -> Option<Credentials> {
        if !self.api_key.is_empty() {
            return Some(Credentials::Bearer(self.api_key.clone()));
        }
        self.username
            .as_ref()
            .filter(|u| !u.is_empty())
            .map(|username| Credentials::Basic {
                username: username.clone(),
                password: self.password.clone(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backup_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from("./backup"),
            output_dir: PathBuf::from("./output"),
            config_dir: PathBuf::from("./config"),
            cache_dir: PathBuf::from(".cache/schemas"),
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// File settings (defaults when `path` is `None`) plus environment
    /// overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ERP_API_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("ERP_API_KEY") {
            self.api.api_key = v;
        }
        if let Some(v) = lookup("ERP_API_USER") {
            self.api.username = Some(v);
        }
        if let Some(v) = lookup("ERP_API_PASSWORD") {
            self.api.password = Some(v);
        }
        if let Some(v) = lookup("ERP_API_TIMEOUT") {
            self.api.timeout_secs = parse_number("ERP_API_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("ERP_BATCH_SIZE") {
            self.api.batch_size = parse_number("ERP_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("MIGRATION_BACKUP_DIR") {
            self.backup_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MIGRATION_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MIGRATION_CONFIG_DIR") {
            self.config_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MIGRATION_CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// Introspector settings derived from these settings
    pub fn introspector_config(&self) -> IntrospectorConfig {
        IntrospectorConfig::new()
            .with_cache_dir(self.cache_dir.clone())
            .with_timeout(self.api.timeout())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
