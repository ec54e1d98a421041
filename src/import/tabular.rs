//! Sheet-shaped sources
//!
//! Excel and Access backups both reduce to named grids of optional cell
//! strings. The first row is the header; the following rows feed type
//! inference.

use crate::inference::{ColumnSampler, TypeInferencer};
use crate::models::source::is_selected;
use crate::models::{SourceSchema, SourceTable};

/// A named grid of cells; `None` is a missing cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Number of header columns, ignoring trailing blank header cells
    fn width(&self) -> usize {
        self.rows.first().map_or(0, |header| {
            header
                .iter()
                .rposition(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty()))
                .map_or(0, |idx| idx + 1)
        })
    }
}

fn row_is_blank(row: &[Option<String>]) -> bool {
    row.iter()
        .all(|cell| cell.as_deref().is_none_or(|c| c.trim().is_empty()))
}

/// Table for one sheet, or `None` when the sheet has no header
pub(crate) fn sheet_to_table(sheet: &Sheet, inferencer: &TypeInferencer) -> Option<SourceTable> {
    let width = sheet.width();
    if width == 0 {
        return None;
    }

    let sample_rows = inferencer.config().sample_size;
    let header = &sheet.rows[0];
    let mut samplers: Vec<ColumnSampler> = (0..width)
        .map(|idx| {
            let name = header
                .get(idx)
                .and_then(|c| c.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Column_{}", idx));
            ColumnSampler::new(name, sample_rows)
        })
        .collect();

    let mut row_count = 0u64;
    for row in sheet.rows.iter().skip(1).filter(|r| !row_is_blank(r)) {
        let sampled = (row_count as usize) < sample_rows;
        for (idx, sampler) in samplers.iter_mut().enumerate() {
            let value = row.get(idx).and_then(|c| c.as_deref());
            if sampled {
                sampler.push(value);
            } else {
                sampler.observe(value);
            }
        }
        row_count += 1;
    }

    let columns = samplers
        .into_iter()
        .map(|s| s.finish(inferencer))
        .collect();

    Some(
        SourceTable::new(sheet.name.clone())
            .with_columns(columns)
            .with_estimated_rows(row_count),
    )
}

/// Schema with one table per selected, non-empty sheet
pub(crate) fn sheets_to_schema(
    database_type: &str,
    sheets: &[Sheet],
    selected_tables: Option<&[String]>,
    inferencer: &TypeInferencer,
) -> SourceSchema {
    let mut schema = SourceSchema::new(database_type);

    for sheet in sheets {
        if !is_selected(&sheet.name, selected_tables) {
            tracing::debug!("Skipping unselected sheet {}", sheet.name);
            continue;
        }
        match sheet_to_table(sheet, inferencer) {
            Some(table) => schema.tables.push(table),
            None => {
                tracing::debug!("Skipping empty sheet {}", sheet.name);
            }
        }
    }

    schema.recompute_totals();
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    #[test]
    fn test_sheet_to_table() {
        let mut sheet = Sheet::new("Produtos");
        sheet.rows = vec![
            cells(&["id", "nome", "peso", ""]),
            cells(&["1", "Mesa", "2.5"]),
            cells(&["", "", ""]),
            cells(&["2", "Cadeira", ""]),
        ];
        let table = sheet_to_table(&sheet, &TypeInferencer::new()).unwrap();
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.estimated_rows, 2);
        assert_eq!(table.columns[0].type_name, "INTEGER");
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[2].type_name, "FLOAT");
        assert!(table.columns[2].nullable);
    }

    #[test]
    fn test_placeholder_header_and_empty_sheets() {
        let mut named = Sheet::new("a");
        named.rows = vec![cells(&["", "x"]), cells(&["1", "2"])];
        let empty = Sheet::new("b");

        let schema = sheets_to_schema(
            "excel",
            &[named, empty],
            None,
            &TypeInferencer::new(),
        );
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].columns[0].name, "Column_0");
    }

    #[test]
    fn test_selection_is_case_insensitive() {
        let mut a = Sheet::new("Clientes");
        a.rows = vec![cells(&["id"]), cells(&["1"])];
        let mut b = Sheet::new("Pedidos");
        b.rows = vec![cells(&["id"]), cells(&["1"]), cells(&["2"])];

        let selected = vec!["pedidos".to_string()];
        let schema = sheets_to_schema("excel", &[a, b], Some(&selected), &TypeInferencer::new());
        assert_eq!(schema.table_names(), vec!["Pedidos"]);
        assert_eq!(schema.total_estimated_rows, 2);
    }
}
