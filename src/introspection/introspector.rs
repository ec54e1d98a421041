//! Fetch and cache orchestration in front of the analyzer

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::analyzer::DestinationSchemaAnalyzer;
use super::cache::SchemaFileCache;
use super::error::{IntrospectionError, IntrospectionResult};
use super::fetcher::SpecFetcher;
use crate::models::{ApiSchema, EndpointSchema};

/// Well-known OpenAPI document locations, tried in order
pub const SWAGGER_ENDPOINTS: [&str; 7] = [
    "/swagger.json",
    "/openapi.json",
    "/v1/swagger.json",
    "/api/swagger.json",
    "/docs/openapi.json",
    "/rest-api-docs",
    "/api-docs",
];

/// Default lifetime of both the in-memory and the file cache
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Tunables for [`SchemaIntrospector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrospectorConfig {
    pub cache_ttl: Duration,
    /// Directory of the file cache; `None` disables it
    pub cache_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub swagger_locations: Vec<String>,
}

impl Default for IntrospectorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: CACHE_TTL,
            cache_dir: Some(PathBuf::from(".cache/schemas")),
            timeout: Duration::from_secs(30),
            swagger_locations: SWAGGER_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IntrospectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn without_file_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_swagger_locations<S: Into<String>>(mut self, locations: Vec<S>) -> Self {
        self.swagger_locations = locations.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of checking a payload against an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadValidation {
    pub is_valid: bool,
    /// Empty when valid
    pub message: String,
}

impl PayloadValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// Discovers and caches the destination API schema
///
/// Two cache tiers sit in front of the fetcher: the analyzed schema in
/// memory, and the raw document on disk. Both expire after the configured
/// TTL. A forced refresh bypasses both.
///
/// # Example
///
/// ```rust,no_run
/// use erp_migration_sdk::introspection::{IntrospectorConfig, SchemaIntrospector};
///
/// let mut introspector =
///     SchemaIntrospector::http("https://erp.example.com", IntrospectorConfig::default(), None)?;
/// let schema = introspector.get_schema(false)?;
/// println!("Found {} endpoints", schema.endpoints.len());
/// # Ok::<(), erp_migration_sdk::introspection::IntrospectionError>(())
/// ```
pub struct SchemaIntrospector {
    base_url: String,
    config: IntrospectorConfig,
    fetcher: Box<dyn SpecFetcher>,
    file_cache: Option<SchemaFileCache>,
    cached: Option<(Arc<ApiSchema>, Instant)>,
}

impl std::fmt::Debug for SchemaIntrospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaIntrospector")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .field("cached", &self.cached.is_some())
            .finish()
    }
}

impl SchemaIntrospector {
    pub fn new(
        base_url: impl Into<String>,
        config: IntrospectorConfig,
        fetcher: Box<dyn SpecFetcher>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let file_cache = config
            .cache_dir
            .as_ref()
            .map(|dir| SchemaFileCache::new(dir, config.cache_ttl));
        Self {
            base_url,
            config,
            fetcher,
            file_cache,
            cached: None,
        }
    }

    /// Introspector backed by the blocking HTTP fetcher
    #[cfg(feature = "api-backend")]
    pub fn http(
        base_url: impl Into<String>,
        config: IntrospectorConfig,
        credentials: Option<crate::config::Credentials>,
    ) -> IntrospectionResult<Self> {
        let fetcher =
            super::fetcher::HttpSpecFetcher::new(config.timeout)?.with_credentials(credentials);
        Ok(Self::new(base_url, config, Box::new(fetcher)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &IntrospectorConfig {
        &self.config
    }

    /// In-memory schema, if one has been loaded
    pub fn cached_schema(&self) -> Option<Arc<ApiSchema>> {
        self.cached.as_ref().map(|(schema, _)| Arc::clone(schema))
    }

    /// Drop the in-memory schema
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// The API schema, from cache when fresh
    ///
    /// Returns the same `Arc` while the in-memory entry is valid.
    pub fn get_schema(&mut self, force_refresh: bool) -> IntrospectionResult<Arc<ApiSchema>> {
        if !force_refresh
            && let Some((schema, loaded_at)) = &self.cached
            && loaded_at.elapsed() < self.config.cache_ttl
        {
            tracing::info!("Using cached schema");
            return Ok(Arc::clone(schema));
        }

        let spec = self.fetch_spec(force_refresh)?;
        let schema = Arc::new(DestinationSchemaAnalyzer::new().analyze(&spec)?);
        self.cached = Some((Arc::clone(&schema), Instant::now()));

        tracing::info!(
            "Successfully introspected {} API endpoints",
            schema.endpoints.len()
        );
        Ok(schema)
    }

    fn fetch_spec(&self, force_refresh: bool) -> IntrospectionResult<Value> {
        if !force_refresh
            && let Some(spec) = self.file_cache.as_ref().and_then(|c| c.load(&self.base_url))
        {
            tracing::info!("Loaded schema from file cache");
            return Ok(spec);
        }

        let spec = self.fetch_from_api()?;
        if let Some(cache) = &self.file_cache
            && let Err(e) = cache.save(&self.base_url, &spec)
        {
            tracing::warn!("Error saving cache file: {}", e);
        }
        Ok(spec)
    }

    fn fetch_from_api(&self) -> IntrospectionResult<Value> {
        for location in &self.config.swagger_locations {
            let url = format!("{}{}", self.base_url, location);
            tracing::debug!("Trying swagger endpoint: {}", url);

            match self.fetcher.fetch(&url) {
                Ok(spec) if spec.is_object() => {
                    tracing::info!("Successfully fetched schema from {}", location);
                    return Ok(spec);
                }
                Ok(_) => {
                    tracing::debug!("Ignoring non-object document from {}", location);
                }
                Err(e) => {
                    tracing::debug!("Failed to fetch from {}: {}", location, e);
                }
            }
        }

        tracing::error!("Could not fetch OpenAPI spec from any endpoint");
        Err(IntrospectionError::SchemaUnavailable {
            base_url: self.base_url.clone(),
            tried: self.config.swagger_locations.clone(),
        })
    }

    /// Schema of one endpoint, if the API declares it
    pub fn get_endpoint_schema(
        &mut self,
        path: &str,
        method: &str,
    ) -> IntrospectionResult<Option<EndpointSchema>> {
        let schema = self.get_schema(false)?;
        Ok(schema.get_endpoint(path, method).cloned())
    }

    /// Check that `payload` carries every required request field
    ///
    /// Field types and formats are not checked.
    pub fn validate_payload(
        &mut self,
        path: &str,
        payload: &Map<String, Value>,
        method: &str,
    ) -> IntrospectionResult<PayloadValidation> {
        let Some(endpoint) = self.get_endpoint_schema(path, method)? else {
            return Ok(PayloadValidation::invalid(format!(
                "Endpoint {} {} not found in schema",
                method.to_uppercase(),
                path
            )));
        };

        for field in &endpoint.required_fields {
            if !payload.contains_key(field) {
                return Ok(PayloadValidation::invalid(format!(
                    "Missing required field: {}",
                    field
                )));
            }
        }
        Ok(PayloadValidation::valid())
    }
}
