//! Validation functionality
//!
//! Provides validation logic for:
//! - Mapping completeness (every non-ignored rule has a destination)
//! - Source column types (outside the normalized type vocabulary)

pub mod mappings;

pub use mappings::{IssueKind, KNOWN_TYPES, ValidationIssue, ValidationReport, validate_mappings};
