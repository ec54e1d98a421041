//! Pre-migration checks over a source schema and its mapping rules

use serde::{Deserialize, Serialize};

use crate::models::{MappingRule, SourceSchema};

/// Column types the SQL normalizer and the tabular inferencer produce
pub const KNOWN_TYPES: &[&str] = &[
    "VARCHAR",
    "CHAR",
    "TEXT",
    "INT",
    "INTEGER",
    "TINYINT",
    "SMALLINT",
    "MEDIUMINT",
    "BIGINT",
    "DECIMAL",
    "FLOAT",
    "DOUBLE",
    "BOOLEAN",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "TIMESTAMPTZ",
    "UUID",
    "JSON",
    "JSONB",
    "BLOB",
];

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A non-ignored rule has no destination table
    MissingTarget,
    /// A column type is outside [`KNOWN_TYPES`]
    UnknownType,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub table: String,
    pub column: String,
    pub message: String,
}

/// All findings for one schema and rule set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of one kind
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// `PASSED` or `FAILED`
    pub fn status(&self) -> &'static str {
        if self.is_valid() { "PASSED" } else { "FAILED" }
    }
}

/// Check rules for missing destinations and columns for unknown types
pub fn validate_mappings(schema: &SourceSchema, rules: &[MappingRule]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for rule in rules.iter().filter(|r| r.target_table.is_none() && !r.ignored) {
        let column = rule.source_columns.first().cloned().unwrap_or_default();
        report.issues.push(ValidationIssue {
            kind: IssueKind::MissingTarget,
            message: format!("Missing target for {}.{}", rule.source_table, column),
            table: rule.source_table.clone(),
            column,
        });
    }

    for table in &schema.tables {
        for column in &table.columns {
            if !KNOWN_TYPES.contains(&column.type_name.to_uppercase().as_str()) {
                report.issues.push(ValidationIssue {
                    kind: IssueKind::UnknownType,
                    message: format!(
                        "Unknown type: {}.{} = {}",
                        table.name, column.name, column.type_name
                    ),
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }

    if !report.is_valid() {
        tracing::warn!("Validation found {} issue(s)", report.issues.len());
    }
    report
}
