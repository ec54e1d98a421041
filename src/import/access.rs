//! Access import
//!
//! `.mdb` / `.accdb` files are read as workbooks exported from Access, one
//! sheet per table, and inferred the same way as Excel sheets. A file that
//! cannot be opened as a workbook aborts the extraction.

use super::excel::load_sheets;
use super::tabular::sheets_to_schema;
use super::{BackupFormat, BackupParser, ImportError, ImportResult};
use crate::inference::TypeInferencer;
use crate::models::SourceSchema;

/// Access database parser
#[derive(Debug, Clone, Default)]
pub struct AccessParser {
    inferencer: TypeInferencer,
}

impl AccessParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inferencer(mut self, inferencer: TypeInferencer) -> Self {
        self.inferencer = inferencer;
        self
    }
}

impl BackupParser for AccessParser {
    fn parse(
        &self,
        content: &[u8],
        selected_tables: Option<&[String]>,
    ) -> ImportResult<SourceSchema> {
        let sheets = load_sheets(content).map_err(|e| match e {
            ImportError::Workbook(msg) => ImportError::Workbook(format!(
                "Failed to parse Access file (expected a workbook export): {}",
                msg
            )),
            other => other,
        })?;
        Ok(sheets_to_schema(
            "access",
            &sheets,
            selected_tables,
            &self.inferencer,
        ))
    }

    fn format(&self) -> BackupFormat {
        BackupFormat::Access
    }
}
