//! Source schema model
//!
//! Structural model extracted from a legacy backup artifact: tables, columns
//! and the constraints between them. One extractor call produces one
//! [`SourceSchema`]; after that the schema is only ever narrowed through
//! [`SourceSchema::filter_tables`], which returns an independent copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A column in a source table
///
/// Identity is the column name, compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceColumn {
    /// Column name as declared in the source
    pub name: String,
    /// Normalized type tag (e.g. `INT`, `VARCHAR`, `INTEGER`, `DATE`)
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the column accepts NULL / empty values (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Raw default expression, if declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub auto_increment: bool,
}

fn default_true() -> bool {
    true
}

impl SourceColumn {
    /// Create a nullable column with no flags set
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            auto_increment: false,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for SourceColumn {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for SourceColumn {}

impl std::hash::Hash for SourceColumn {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
    }
}

/// Foreign key from a local column to a column of another table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Kind of a table-level constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::PrimaryKey => write!(f, "PRIMARY_KEY"),
            ConstraintKind::Unique => write!(f, "UNIQUE"),
            ConstraintKind::ForeignKey => write!(f, "FOREIGN_KEY"),
            ConstraintKind::Check => write!(f, "CHECK"),
        }
    }
}

/// Target of a foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintReference {
    pub table: String,
    pub columns: Vec<String>,
}

/// A table-level constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Declared name (`CONSTRAINT <name> ...`), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    /// Local columns covered by the constraint
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<ConstraintReference>,
    /// Raw expression of a CHECK constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, columns: Vec<String>) -> Self {
        Self {
            name: None,
            kind,
            columns,
            references: None,
            expression: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

/// A table in the source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTable {
    pub name: String,
    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<SourceColumn>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Best-effort row estimate
    #[serde(default)]
    pub estimated_rows: u64,
}

impl SourceTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            constraints: Vec::new(),
            estimated_rows: 0,
        }
    }

    pub fn with_columns(mut self, columns: Vec<SourceColumn>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_estimated_rows(mut self, rows: u64) -> Self {
        self.estimated_rows = rows;
        self
    }

    /// Column by name, case-insensitive
    pub fn get_column(&self, name: &str) -> Option<&SourceColumn> {
        self.columns.iter().find(|c| c.is_named(name))
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut SourceColumn> {
        self.columns.iter_mut().find(|c| c.is_named(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Complete schema extracted from one backup artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSchema {
    /// Source tag: a SQL dialect (`postgresql`, `mysql`, ...) or `csv`,
    /// `excel`, `access`
    pub database_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tables: Vec<SourceTable>,
    #[serde(default)]
    pub total_estimated_rows: u64,
    /// Recovered clause/row/sheet problems encountered during extraction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SourceSchema {
    pub fn new(database_type: impl Into<String>) -> Self {
        Self {
            database_type: database_type.into(),
            created_at: Utc::now(),
            tables: Vec::new(),
            total_estimated_rows: 0,
            warnings: Vec::new(),
        }
    }

    /// Table by name, case-insensitive
    pub fn get_table(&self, name: &str) -> Option<&SourceTable> {
        self.tables.iter().find(|t| t.is_named(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Recompute `total_estimated_rows` from the table estimates
    pub fn recompute_totals(&mut self) {
        self.total_estimated_rows = self.tables.iter().map(|t| t.estimated_rows).sum();
    }

    /// New schema holding only the named tables (case-insensitive)
    ///
    /// The result is a deep copy; nothing is shared with `self`.
    pub fn filter_tables<S: AsRef<str>>(&self, names: &[S]) -> SourceSchema {
        let tables = self
            .tables
            .iter()
            .filter(|t| names.iter().any(|n| t.is_named(n.as_ref())))
            .cloned()
            .collect();

        let mut filtered = SourceSchema {
            database_type: self.database_type.clone(),
            created_at: self.created_at,
            tables,
            total_estimated_rows: 0,
            warnings: self.warnings.clone(),
        };
        filtered.recompute_totals();
        filtered
    }
}

/// Whether a table passes an optional selection list (case-insensitive)
pub(crate) fn is_selected(name: &str, selected_tables: Option<&[String]>) -> bool {
    match selected_tables {
        None => true,
        Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> SourceSchema {
        let mut schema = SourceSchema::new("postgresql");
        schema.tables.push(
            SourceTable::new("customers")
                .with_columns(vec![
                    SourceColumn::new("id", "INT").with_primary_key(true),
                    SourceColumn::new("name", "VARCHAR"),
                ])
                .with_estimated_rows(10),
        );
        schema
            .tables
            .push(SourceTable::new("orders").with_estimated_rows(5));
        schema.recompute_totals();
        schema
    }

    #[test]
    fn test_column_identity_is_case_insensitive_name() {
        let a = SourceColumn::new("Email", "VARCHAR");
        let b = SourceColumn::new("email", "TEXT").with_nullable(false);
        assert_eq!(a, b);
        assert_ne!(a, SourceColumn::new("phone", "VARCHAR"));
    }

    #[test]
    fn test_lookups_ignore_case() {
        let schema = sample_schema();
        let table = schema.get_table("CUSTOMERS").unwrap();
        assert!(table.get_column("NAME").is_some());
        assert!(schema.get_table("missing").is_none());
    }

    #[test]
    fn test_filter_tables_recomputes_totals() {
        let schema = sample_schema();
        assert_eq!(schema.total_estimated_rows, 15);

        let filtered = schema.filter_tables(&["Orders"]);
        assert_eq!(filtered.tables.len(), 1);
        assert_eq!(filtered.total_estimated_rows, 5);
        // Original untouched
        assert_eq!(schema.tables.len(), 2);
    }

    #[test]
    fn test_constraint_kind_serializes_screaming() {
        let c = Constraint::new(ConstraintKind::PrimaryKey, vec!["id".into()]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "PRIMARY_KEY");
    }
}
