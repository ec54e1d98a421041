//! Payload building
//!
//! Compiles declarative [`PayloadConfig`](crate::models::PayloadConfig)s and
//! source rows into destination API payloads:
//! - [`FieldBuilder`] builds one field (direct, `{id}` reference, reference
//!   array, or attribute array)
//! - [`PayloadBuilder`] assembles rows, batches and whole tables
//! - [`TemplateEngine`] evaluates `${...}` templates
//! - [`TransformerRegistry`] holds the named value transformers

mod error;
mod field;
mod payload;
mod template;
mod transformers;

pub use error::{BuildError, BuildResult, TransformError};
pub use field::{FieldBuilder, IdMappings, Row};
pub use payload::{BatchOutcome, PayloadBuilder, SkippedRow, load_payload_configs};
pub use template::TemplateEngine;
pub use transformers::{TransformFn, TransformerRegistry, stringify};
