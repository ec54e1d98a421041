//! Excel import
//!
//! One table per worksheet. Requires the `excel` feature; without it parsing
//! fails with [`ImportError::FeatureDisabled`].

use super::tabular::{Sheet, sheets_to_schema};
use super::{BackupFormat, BackupParser, ImportError, ImportResult};
use crate::inference::TypeInferencer;
use crate::models::SourceSchema;

/// Read the worksheets of an xlsx workbook
#[cfg(feature = "excel")]
pub(crate) fn load_sheets(content: &[u8]) -> ImportResult<Vec<Sheet>> {
    super::workbook::read_workbook(content)
}

#[cfg(not(feature = "excel"))]
pub(crate) fn load_sheets(_content: &[u8]) -> ImportResult<Vec<Sheet>> {
    Err(ImportError::FeatureDisabled("excel"))
}

/// Excel workbook parser
#[derive(Debug, Clone, Default)]
pub struct ExcelParser {
    inferencer: TypeInferencer,
}

impl ExcelParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inferencer(mut self, inferencer: TypeInferencer) -> Self {
        self.inferencer = inferencer;
        self
    }

    /// Build a schema from already-loaded sheets
    pub fn parse_sheets(
        &self,
        sheets: &[Sheet],
        selected_tables: Option<&[String]>,
    ) -> SourceSchema {
        sheets_to_schema("excel", sheets, selected_tables, &self.inferencer)
    }
}

impl BackupParser for ExcelParser {
    fn parse(
        &self,
        content: &[u8],
        selected_tables: Option<&[String]>,
    ) -> ImportResult<SourceSchema> {
        let sheets = load_sheets(content).map_err(|e| match e {
            ImportError::Workbook(msg) => {
                ImportError::Workbook(format!("Failed to parse Excel file: {}", msg))
            }
            other => other,
        })?;
        Ok(self.parse_sheets(&sheets, selected_tables))
    }

    fn format(&self) -> BackupFormat {
        BackupFormat::Excel
    }
}

#[cfg(all(test, feature = "excel"))]
mod tests {
    use super::*;
    use crate::import::workbook::fixtures::{build_xlsx, build_xlsx_parts, date_styles_xml};

    #[test]
    fn test_one_table_per_sheet() {
        let bytes = build_xlsx(&[
            (
                "Produtos",
                vec![
                    vec!["id", "nome", "peso"],
                    vec!["1", "Mesa", "2.5"],
                    vec!["2", "Cadeira", "1.25"],
                ],
            ),
            ("Marcas", vec![vec!["id", "nome"], vec!["10", "Acme"]]),
            ("Notas", vec![]),
        ]);

        let schema = ExcelParser::new().parse(&bytes, None).unwrap();
        assert_eq!(schema.database_type, "excel");
        assert_eq!(schema.table_names(), vec!["Produtos", "Marcas"]);
        let produtos = schema.get_table("produtos").unwrap();
        assert_eq!(produtos.estimated_rows, 2);
        assert_eq!(produtos.get_column("peso").unwrap().type_name, "FLOAT");
        assert_eq!(schema.total_estimated_rows, 3);
    }

    #[test]
    fn test_date_formatted_column_infers_date() {
        let bytes = build_xlsx_parts(
            &[(
                "Pedidos",
                vec![
                    vec!["id", "emissao"],
                    vec!["1", "44931|1"],
                    vec!["2", "44940|1"],
                ],
            )],
            vec![date_styles_xml()],
        );
        let schema = ExcelParser::new().parse(&bytes, None).unwrap();
        let pedidos = schema.get_table("Pedidos").unwrap();
        assert_eq!(pedidos.get_column("emissao").unwrap().type_name, "DATE");
        assert_eq!(pedidos.get_column("id").unwrap().type_name, "INTEGER");
    }

    #[test]
    fn test_unreadable_workbook_is_fatal() {
        let err = ExcelParser::new().parse(b"PK\x03\x04garbage", None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse Excel file"));
    }
}
