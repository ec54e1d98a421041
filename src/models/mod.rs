//! Models module for the SDK
//!
//! Defines the data structures shared by the migration pipeline: the source
//! schema extracted from backups, the normalized destination API schema, and
//! the mapping rules and payload configuration that connect them.

pub mod api;
pub mod mapping;
pub mod source;

pub use api::{ApiSchema, EndpointField, EndpointSchema, FieldType, SemanticType, endpoint_key};
pub use mapping::{
    AttributeMapping, FieldKind, FieldMapping, MappingRule, MappingType, MatchMethod,
    PayloadConfig,
};
pub use source::{
    Constraint, ConstraintKind, ConstraintReference, ForeignKey, SourceColumn, SourceSchema,
    SourceTable,
};
