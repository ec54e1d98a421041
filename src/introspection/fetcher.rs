//! Retrieval of raw OpenAPI documents

use serde_json::Value;

use super::error::IntrospectionResult;
#[cfg(feature = "api-backend")]
use super::error::IntrospectionError;
#[cfg(feature = "api-backend")]
use crate::config::Credentials;

/// Fetches and decodes one OpenAPI document by URL
///
/// The introspector only depends on this trait, so documents can come from
/// HTTP, disk or memory.
pub trait SpecFetcher {
    fn fetch(&self, url: &str) -> IntrospectionResult<Value>;
}

/// Blocking HTTP fetcher
#[cfg(feature = "api-backend")]
#[derive(Debug, Clone)]
pub struct HttpSpecFetcher {
    client: reqwest::blocking::Client,
    credentials: Option<Credentials>,
}

#[cfg(feature = "api-backend")]
impl HttpSpecFetcher {
    /// Create a fetcher with a request timeout
    pub fn new(timeout: std::time::Duration) -> IntrospectionResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IntrospectionError::Fetch {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

#[cfg(feature = "api-backend")]
impl SpecFetcher for HttpSpecFetcher {
    fn fetch(&self, url: &str) -> IntrospectionResult<Value> {
        let fetch_error = |message: String| IntrospectionError::Fetch {
            url: url.to_string(),
            message,
        };

        let mut request = self.client.get(url);
        request = match &self.credentials {
            Some(Credentials::Bearer(token)) => request.bearer_auth(token),
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, password.as_deref())
            }
            None => request,
        };

        let response = request.send().map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP error {}", response.status())));
        }

        let text = response.text().map_err(|e| fetch_error(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| fetch_error(format!("Invalid JSON: {}", e)))
    }
}
