//! ERP Migration SDK - Schema discovery and payload mapping for moving legacy
//! databases into REST/OpenAPI ERP systems
//!
//! Provides unified interfaces for:
//! - Source schema extraction from SQL dumps, CSV, Excel and Access backups
//! - Destination schema analysis of OpenAPI documents, with caching
//! - Heuristic table/column/endpoint matching
//! - Payload construction from declarative field mappings
//! - Pre-migration validation and manifest export

pub mod builder;
pub mod config;
pub mod export;
pub mod import;
pub mod inference;
pub mod introspection;
pub mod mapping;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use builder::{
    BatchOutcome, BuildError, BuildResult, PayloadBuilder, TemplateEngine, TransformerRegistry,
};
pub use config::{ApiConfig, AppConfig, ConfigError, Credentials};
pub use export::{ExportError, ExportResult, MigrationManifest};
pub use import::{
    AccessParser, BackupFormat, BackupParser, CsvParser, DialectDetector, ExcelParser,
    ImportError, ImportResult, SqlDialect, SqlParser, create_parser, parse_backup,
};
pub use inference::{InferenceConfig, InferredType, TypeInferencer};
#[cfg(feature = "api-backend")]
pub use introspection::HttpSpecFetcher;
pub use introspection::{
    DestinationSchemaAnalyzer, IntrospectionError, IntrospectionResult, IntrospectorConfig,
    SchemaIntrospector, SpecFetcher,
};
pub use mapping::{
    AliasRegistry, DestinationCatalog, EndpointMapper, HeuristicMatcher, MappingError,
    MatcherConfig,
};
pub use validation::{ValidationReport, validate_mappings};

// Re-export models
pub use models::{
    ApiSchema, EndpointField, EndpointSchema, FieldMapping, MappingRule, PayloadConfig,
    SourceColumn, SourceSchema, SourceTable,
};
