//! Error types for destination schema introspection

use std::path::PathBuf;

/// Error during API schema discovery or analysis
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("Could not fetch OpenAPI spec from {base_url}. Tried endpoints: {}", tried.join(", "))]
    SchemaUnavailable { base_url: String, tried: Vec<String> },
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Invalid OpenAPI document: {0}")]
    InvalidDocument(String),
    #[error("Endpoint {method} {path} not found in schema")]
    EndpointNotFound { method: String, path: String },
    #[error("Schema cache error at {path}: {message}")]
    Cache { path: PathBuf, message: String },
}

/// Result type for introspection operations
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;
