//! Column type inference for loosely-typed tabular sources
//!
//! CSV, Excel and Access backups carry no declared column types. This module
//! samples raw cell values and picks a coarse semantic type for each column.
//!
//! ## Example
//!
//! ```rust
//! use erp_migration_sdk::inference::{InferredType, TypeInferencer};
//!
//! let inferencer = TypeInferencer::new();
//! let ty = inferencer.infer("age", &["31", "42", "27", "55", "19"]);
//! assert_eq!(ty, InferredType::Integer);
//! ```

mod config;
mod inferrer;

pub use config::{InferenceConfig, InferenceConfigBuilder};
pub use inferrer::{ColumnSampler, InferredType, TypeInferencer};
