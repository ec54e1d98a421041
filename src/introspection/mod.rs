//! Destination schema introspection
//!
//! Turns the destination API's OpenAPI document into an
//! [`ApiSchema`](crate::models::ApiSchema):
//! - [`DestinationSchemaAnalyzer`] walks a decoded document, following `$ref`
//!   chains with cycle detection
//! - [`SchemaIntrospector`] discovers the document at well-known locations and
//!   caches it in memory and on disk

mod analyzer;
mod cache;
mod error;
mod fetcher;
mod introspector;

pub use analyzer::{DestinationSchemaAnalyzer, HTTP_METHODS};
pub use cache::SchemaFileCache;
pub use error::{IntrospectionError, IntrospectionResult};
#[cfg(feature = "api-backend")]
pub use fetcher::HttpSpecFetcher;
pub use fetcher::SpecFetcher;
pub use introspector::{
    CACHE_TTL, IntrospectorConfig, PayloadValidation, SWAGGER_ENDPOINTS, SchemaIntrospector,
};
