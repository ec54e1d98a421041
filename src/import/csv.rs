//! CSV import
//!
//! A CSV backup becomes a single table. The delimiter is detected from the
//! head of the file, the first record is the header and the following rows
//! feed type inference.

use super::{BackupFormat, BackupParser, ImportResult};
use crate::inference::{ColumnSampler, TypeInferencer};
use crate::models::{SourceSchema, SourceTable};

/// Candidate delimiters, in tie-break order
pub const DELIMITERS: [u8; 4] = [b',', b';', b'|', b'\t'];

/// Characters inspected for delimiter detection
const DETECTION_WINDOW: usize = 1000;

/// Name of the synthetic table produced from a CSV file
pub const DEFAULT_TABLE_NAME: &str = "data";

/// Most frequent candidate delimiter in the first 1000 characters; comma when
/// none occurs
pub fn detect_delimiter(content: &str) -> u8 {
    let head: String = content.chars().take(DETECTION_WINDOW).collect();
    let mut best = (b',', 0usize);
    for delimiter in DELIMITERS {
        let count = head.bytes().filter(|b| *b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

/// CSV backup parser
#[derive(Debug, Clone)]
pub struct CsvParser {
    inferencer: TypeInferencer,
    table_name: String,
    delimiter: Option<u8>,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            inferencer: TypeInferencer::new(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            delimiter: None,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inferencer(mut self, inferencer: TypeInferencer) -> Self {
        self.inferencer = inferencer;
        self
    }

    /// Name the produced table instead of `data`
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Use a fixed delimiter instead of detecting one
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Parse CSV text
    pub fn parse_text(&self, content: &str) -> SourceSchema {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut schema = SourceSchema::new("csv");
        if content.trim().is_empty() {
            return schema;
        }

        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(content));
        tracing::debug!("Using CSV delimiter {:?}", delimiter as char);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = reader.records();
        let headers = match records.next() {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                let msg = format!("{}: unreadable header row: {}", self.table_name, e);
                tracing::warn!("{}", msg);
                schema.warnings.push(msg);
                return schema;
            }
            None => return schema,
        };

        let sample_rows = self.inferencer.config().sample_size;
        let mut samplers: Vec<ColumnSampler> = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let name = header.trim();
                let name = if name.is_empty() {
                    format!("column_{}", idx)
                } else {
                    name.to_string()
                };
                ColumnSampler::new(name, sample_rows)
            })
            .collect();

        let mut row_count = 0u64;
        for (idx, record) in records.enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let msg = format!("{}: skipped row {}: {}", self.table_name, idx + 2, e);
                    tracing::warn!("{}", msg);
                    schema.warnings.push(msg);
                    continue;
                }
            };
            row_count += 1;

            let sampled = idx < sample_rows;
            for (col, sampler) in samplers.iter_mut().enumerate() {
                let value = record.get(col);
                if sampled {
                    sampler.push(value);
                } else {
                    sampler.observe(value);
                }
            }
        }

        let columns = samplers
            .into_iter()
            .map(|s| s.finish(&self.inferencer))
            .collect();

        schema.tables.push(
            SourceTable::new(self.table_name.clone())
                .with_columns(columns)
                .with_estimated_rows(row_count),
        );
        schema.recompute_totals();
        schema
    }
}

impl BackupParser for CsvParser {
    /// The selection list is not applied: a CSV file always yields its one
    /// table.
    fn parse(
        &self,
        content: &[u8],
        _selected_tables: Option<&[String]>,
    ) -> ImportResult<SourceSchema> {
        let text = String::from_utf8_lossy(content);
        Ok(self.parse_text(&text))
    }

    fn format(&self) -> BackupFormat {
        BackupFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter("a\tb\n1\t2"), b'\t');
        assert_eq!(detect_delimiter("a|b\n1|2"), b'|');
        assert_eq!(detect_delimiter("single\nvalue"), b',');
    }

    #[test]
    fn test_parse_semicolon_csv() {
        let csv = "id;name;price;active\n1;Ana;9.5;yes\n2;Bruno;10;no\n3;;7.25;yes\n";
        let schema = CsvParser::new().parse_text(csv);
        assert_eq!(schema.database_type, "csv");
        let table = schema.get_table("data").unwrap();
        assert_eq!(table.estimated_rows, 3);
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.columns[0].type_name, "INTEGER");
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].type_name, "VARCHAR");
        assert!(table.columns[1].nullable);
        assert_eq!(table.columns[2].type_name, "FLOAT");
        assert_eq!(table.columns[3].type_name, "BOOLEAN");
    }

    #[test]
    fn test_short_rows_are_nullable() {
        let csv = "a,b\n1,2\n3\n";
        let schema = CsvParser::new().parse_text(csv);
        let table = &schema.tables[0];
        assert!(!table.columns[0].nullable);
        assert!(table.columns[1].nullable);
    }

    #[test]
    fn test_empty_input_yields_no_tables() {
        let schema = CsvParser::new().parse_text("");
        assert!(schema.tables.is_empty());
    }

    #[test]
    fn test_blank_header_gets_placeholder() {
        let schema = CsvParser::new()
            .with_table_name("clientes")
            .parse_text("id,,nome\n1,x,y\n");
        let table = &schema.tables[0];
        assert_eq!(table.name, "clientes");
        assert_eq!(table.columns[1].name, "column_1");
    }
}
