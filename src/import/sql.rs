//! SQL dump import
//!
//! Extracts tables, columns and basic constraints from `CREATE TABLE`
//! statements. This is a structural scanner, not a SQL grammar: clause lists
//! are split on top-level commas (tracking bracket depth and quotes), each
//! clause is classified as a column or a table constraint, and raw types are
//! normalized to a small vocabulary.
//!
//! Row counts are estimated from `INSERT INTO ... VALUES` tuples and
//! PostgreSQL `COPY ... FROM stdin` blocks.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::dialect::{DialectDetector, SqlDialect};
use super::{BackupFormat, BackupParser, ImportResult};
use crate::models::source::is_selected;
use crate::models::{
    Constraint, ConstraintKind, ConstraintReference, ForeignKey, SourceColumn, SourceSchema,
    SourceTable,
};

const IDENT: &str = r#"(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[\w$]+)"#;

static QUALIFIED: Lazy<String> = Lazy::new(|| format!(r"{i}(?:\s*\.\s*{i})*", i = IDENT));

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(IDENT).unwrap());

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bCREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMPORARY|TEMP|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?({q})\s*\(",
        q = *QUALIFIED
    ))
    .unwrap()
});

static INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bINSERT\s+(?:IGNORE\s+)?INTO\s+({q})\s*(?:\([^)]*\)\s*)?VALUES\s*",
        q = *QUALIFIED
    ))
    .unwrap()
});

static COPY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?im)^COPY\s+({q})(?:\s*\([^)]*\))?\s+FROM\s+stdin;?[ \t]*\r?$",
        q = *QUALIFIED
    ))
    .unwrap()
});

static TABLE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:CONSTRAINT\b|PRIMARY\s+KEY\b|UNIQUE\b|FOREIGN\s+KEY\b|CHECK\b)").unwrap()
});

static INDEX_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:KEY|INDEX|FULLTEXT|SPATIAL|EXCLUDE|PERIOD)\b").unwrap());

static COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?s)^({i})\s+(.+)$", i = IDENT)).unwrap());

static TYPE_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:NOT\s+NULL|NULL|DEFAULT|PRIMARY\s+KEY|UNIQUE|REFERENCES|CHECK|AUTO_INCREMENT|AUTOINCREMENT|IDENTITY|COLLATE|CHARACTER\s+SET|CHARSET|GENERATED|CONSTRAINT|COMMENT|ON\s+UPDATE|COMPUTED\s+BY)\b",
    )
    .unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());
static UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());
static AUTO_INCREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:AUTO_INCREMENT|AUTOINCREMENT|IDENTITY)\b").unwrap()
});
static DEFAULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDEFAULT\s+('(?:[^']|'')*'|\((?:[^()]|\([^()]*\))*\)|[^\s,]+)").unwrap()
});
static REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bREFERENCES\s+({q})\s*(?:\(\s*({i})\s*\))?",
        q = *QUALIFIED,
        i = IDENT
    ))
    .unwrap()
});
static INLINE_CHECK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCHECK\s*\(").unwrap());

static NAMED_CONSTRAINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?is)^CONSTRAINT\s+({i})\s+(.*)$", i = IDENT)).unwrap());
static TABLE_PK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^PRIMARY\s+KEY[^(]*\(([^)]*)\)").unwrap());
static TABLE_UNIQUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^UNIQUE\b[^(]*\(([^)]*)\)").unwrap());
static TABLE_FK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^FOREIGN\s+KEY[^(]*\(([^)]*)\)\s*REFERENCES\s+({q})\s*(?:\(([^)]*)\))?",
        q = *QUALIFIED
    ))
    .unwrap()
});
static TABLE_CHECK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^CHECK\s*\(").unwrap());

static PARENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"--[^\n]*").unwrap());
static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Raw type prefix → normalized type
const TYPE_ALIASES: &[(&str, &str)] = &[
    // PostgreSQL
    ("serial", "INT"),
    ("bigserial", "BIGINT"),
    ("smallserial", "SMALLINT"),
    ("uuid", "UUID"),
    ("boolean", "BOOLEAN"),
    ("bool", "BOOLEAN"),
    ("integer", "INT"),
    ("int4", "INT"),
    ("bigint", "BIGINT"),
    ("int8", "BIGINT"),
    ("smallint", "SMALLINT"),
    ("int2", "SMALLINT"),
    ("decimal", "DECIMAL"),
    ("numeric", "DECIMAL"),
    ("real", "FLOAT"),
    ("double precision", "DOUBLE"),
    ("varchar", "VARCHAR"),
    ("character varying", "VARCHAR"),
    ("text", "TEXT"),
    ("date", "DATE"),
    ("time", "TIME"),
    ("timestamp", "TIMESTAMP"),
    ("timestamp without time zone", "TIMESTAMP"),
    ("timestamp with time zone", "TIMESTAMPTZ"),
    ("timestamptz", "TIMESTAMPTZ"),
    ("json", "JSON"),
    ("jsonb", "JSONB"),
    ("bytea", "BLOB"),
    // MySQL
    ("int", "INT"),
    ("tinyint", "TINYINT"),
    ("mediumint", "MEDIUMINT"),
    ("float", "FLOAT"),
    ("double", "DOUBLE"),
    ("char", "CHAR"),
    ("character", "CHAR"),
    ("datetime", "TIMESTAMP"),
    ("tinytext", "TEXT"),
    ("mediumtext", "TEXT"),
    ("longtext", "TEXT"),
    ("blob", "BLOB"),
    ("mediumblob", "BLOB"),
    ("longblob", "BLOB"),
    ("enum", "VARCHAR"),
    ("set", "VARCHAR"),
    // Oracle
    ("number", "DECIMAL"),
    ("varchar2", "VARCHAR"),
    ("nvarchar2", "VARCHAR"),
    ("nvarchar", "VARCHAR"),
    ("nchar", "CHAR"),
    ("clob", "TEXT"),
    ("nclob", "TEXT"),
    // Firebird
    ("double precision", "DOUBLE"),
    ("blob sub_type text", "TEXT"),
];

/// Whether `text` starts with `prefix` followed by a non-identifier character
fn has_word_prefix(text: &str, prefix: &str) -> bool {
    text.starts_with(prefix)
        && text[prefix.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
}

/// Normalize a raw SQL type to the common vocabulary
///
/// Size/precision suffixes are dropped and the longest matching alias prefix
/// wins; unknown types are returned as their first word in upper case.
pub fn normalize_type(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = PARENS_RE.replace_all(&lowered, "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    TYPE_ALIASES
        .iter()
        .filter(|(prefix, _)| has_word_prefix(&cleaned, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, normalized)| normalized.to_string())
        .unwrap_or_else(|| {
            cleaned
                .split(' ')
                .next()
                .unwrap_or_default()
                .to_uppercase()
        })
}

/// Strip surrounding identifier quotes
fn unquote(ident: &str) -> String {
    let ident = ident.trim();
    let stripped = ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| ident.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .or_else(|| ident.strip_prefix('[').and_then(|s| s.strip_suffix(']')));
    stripped.unwrap_or(ident).to_string()
}

/// Last segment of a possibly schema-qualified name
fn last_segment(qualified: &str) -> String {
    IDENT_RE
        .find_iter(qualified)
        .last()
        .map(|m| unquote(m.as_str()))
        .unwrap_or_else(|| unquote(qualified))
}

fn column_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(unquote)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Index of the `)` closing the `(` at `open`, honouring quotes and `--`
/// comments
fn find_closing(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'(' => depth += 1,
                b')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Split a clause list on commas at bracket depth 0, outside quotes
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut start = 0;

    for (i, b) in body.bytes().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth -= 1,
                b',' if depth == 0 => {
                    parts.push(body[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(body[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Position of the first match of `re` outside parentheses
fn first_top_level_match(re: &Regex, text: &str) -> Option<usize> {
    re.find_iter(text).map(|m| m.start()).find(|&start| {
        let prefix = &text[..start];
        prefix.matches('(').count() <= prefix.matches(')').count()
    })
}

/// Count `(...)` value tuples following `VALUES`, up to the closing `;`
fn count_value_tuples(text: &str) -> u64 {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 1,
                b'\'' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'\'' => in_string = true,
                b'(' => {
                    if depth == 0 {
                        count += 1;
                    }
                    depth += 1;
                }
                b')' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => break,
                _ => {}
            }
        }
        i += 1;
    }
    count
}

/// Per-table row estimates keyed by lower-cased table name
fn estimate_rows(sql: &str) -> HashMap<String, u64> {
    let mut rows: HashMap<String, u64> = HashMap::new();

    for caps in INSERT_RE.captures_iter(sql) {
        let (Some(name), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let tuples = count_value_tuples(&sql[whole.end()..]);
        *rows.entry(last_segment(name.as_str()).to_lowercase()).or_default() += tuples;
    }

    for caps in COPY_RE.captures_iter(sql) {
        let (Some(name), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let lines = sql[whole.end()..]
            .lines()
            .skip_while(|l| l.is_empty())
            .take_while(|l| l.trim_end() != "\\.")
            .count() as u64;
        *rows.entry(last_segment(name.as_str()).to_lowercase()).or_default() += lines;
    }

    rows
}

/// Table-level constraint clause, with the foreign keys it declares
fn parse_table_constraint(clause: &str) -> Option<(Constraint, Vec<ForeignKey>)> {
    let (name, body) = match NAMED_CONSTRAINT_RE.captures(clause) {
        Some(caps) => (
            caps.get(1).map(|m| unquote(m.as_str())),
            caps.get(2).map_or("", |m| m.as_str()),
        ),
        None => (None, clause),
    };

    if let Some(caps) = TABLE_PK_RE.captures(body) {
        let columns = column_list(caps.get(1)?.as_str());
        return Some((
            Constraint::new(ConstraintKind::PrimaryKey, columns).with_name(name),
            Vec::new(),
        ));
    }

    if let Some(caps) = TABLE_UNIQUE_RE.captures(body) {
        let columns = column_list(caps.get(1)?.as_str());
        return Some((
            Constraint::new(ConstraintKind::Unique, columns).with_name(name),
            Vec::new(),
        ));
    }

    if let Some(caps) = TABLE_FK_RE.captures(body) {
        let columns = column_list(caps.get(1)?.as_str());
        let referenced_table = last_segment(caps.get(2)?.as_str());
        let referenced_columns = caps
            .get(3)
            .map(|m| column_list(m.as_str()))
            .unwrap_or_default();

        let foreign_keys = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| ForeignKey {
                column: column.clone(),
                referenced_table: referenced_table.clone(),
                referenced_column: referenced_columns
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| "id".to_string()),
            })
            .collect();

        let mut constraint = Constraint::new(ConstraintKind::ForeignKey, columns).with_name(name);
        constraint.references = Some(ConstraintReference {
            table: referenced_table,
            columns: referenced_columns,
        });
        return Some((constraint, foreign_keys));
    }

    if let Some(m) = TABLE_CHECK_RE.find(body) {
        let open = m.end() - 1;
        let close = find_closing(body, open)?;
        let mut constraint = Constraint::new(ConstraintKind::Check, Vec::new()).with_name(name);
        constraint.expression = Some(body[open + 1..close].trim().to_string());
        return Some((constraint, Vec::new()));
    }

    None
}

/// Column clause and the inline constraints it carries
struct ParsedColumn {
    column: SourceColumn,
    foreign_key: Option<ForeignKey>,
    check: Option<String>,
}

fn parse_column(clause: &str) -> Option<ParsedColumn> {
    let caps = COLUMN_RE.captures(clause)?;
    let name = unquote(caps.get(1)?.as_str());
    let rest = caps.get(2)?.as_str().trim();

    let type_end = first_top_level_match(&TYPE_END_RE, rest).unwrap_or(rest.len());
    let raw_type = rest[..type_end].trim();
    if raw_type.is_empty() {
        return None;
    }
    let flags = &rest[type_end..];

    let type_name = normalize_type(raw_type);
    let primary_key = PRIMARY_KEY_RE.is_match(flags);
    let serial = has_word_prefix(&raw_type.to_lowercase(), "serial")
        || has_word_prefix(&raw_type.to_lowercase(), "bigserial")
        || has_word_prefix(&raw_type.to_lowercase(), "smallserial");

    let mut column = SourceColumn::new(name.clone(), type_name);
    column.nullable = !NOT_NULL_RE.is_match(flags) && !primary_key;
    column.primary_key = primary_key;
    column.unique = UNIQUE_RE.is_match(flags);
    column.auto_increment = serial || AUTO_INCREMENT_RE.is_match(flags);
    column.default = DEFAULT_RE
        .captures(flags)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let foreign_key = REFERENCES_RE.captures(flags).and_then(|c| {
        Some(ForeignKey {
            column: name.clone(),
            referenced_table: last_segment(c.get(1)?.as_str()),
            referenced_column: c
                .get(2)
                .map(|m| unquote(m.as_str()))
                .unwrap_or_else(|| "id".to_string()),
        })
    });

    let check = INLINE_CHECK_RE.find(flags).and_then(|m| {
        let open = m.end() - 1;
        let close = find_closing(flags, open)?;
        Some(flags[open + 1..close].trim().to_string())
    });

    Some(ParsedColumn {
        column,
        foreign_key,
        check,
    })
}

/// SQL dump parser
#[derive(Debug, Clone, Default)]
pub struct SqlParser {
    dialect: Option<SqlDialect>,
}

impl SqlParser {
    /// Parser that auto-detects the dialect
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with a fixed dialect
    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            dialect: Some(dialect),
        }
    }

    /// Parse SQL text
    pub fn parse_sql(&self, sql: &str, selected_tables: Option<&[String]>) -> SourceSchema {
        let dialect = self.dialect.unwrap_or_else(|| DialectDetector::detect(sql));
        let mut schema = SourceSchema::new(dialect.as_str());
        let row_estimates = estimate_rows(sql);

        for caps in CREATE_TABLE_RE.captures_iter(sql) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let table_name = last_segment(name.as_str());
            let open = whole.end() - 1;

            let body = match find_closing(sql, open) {
                Some(close) => &sql[open + 1..close],
                None => {
                    let msg = format!(
                        "{}: unterminated CREATE TABLE, reading to end of input",
                        table_name
                    );
                    tracing::warn!("{}", msg);
                    schema.warnings.push(msg);
                    &sql[open + 1..]
                }
            };

            if !is_selected(&table_name, selected_tables) {
                tracing::debug!("Skipping unselected table {}", table_name);
                continue;
            }

            let mut table = self.parse_table(&table_name, body, &mut schema.warnings);
            table.estimated_rows = row_estimates
                .get(&table_name.to_lowercase())
                .copied()
                .unwrap_or(0);
            schema.tables.push(table);
        }

        schema.recompute_totals();
        tracing::debug!(
            "Parsed {} table(s) from {} SQL dump",
            schema.tables.len(),
            dialect
        );
        schema
    }

    fn parse_table(&self, name: &str, body: &str, warnings: &mut Vec<String>) -> SourceTable {
        let body = BLOCK_COMMENT_RE.replace_all(body, "");
        let body = LINE_COMMENT_RE.replace_all(&body, "");

        let mut table = SourceTable::new(name);
        let mut inline_pk: Vec<String> = Vec::new();
        let mut table_pk: Option<Constraint> = None;

        for clause in split_top_level(&body) {
            if INDEX_CLAUSE_RE.is_match(clause) {
                tracing::debug!("{}: ignoring index clause '{}'", name, clause);
                continue;
            }

            if TABLE_CONSTRAINT_RE.is_match(clause) {
                match parse_table_constraint(clause) {
                    Some((constraint, fks)) => {
                        table.foreign_keys.extend(fks);
                        if constraint.kind == ConstraintKind::PrimaryKey {
                            table_pk = Some(constraint);
                        } else {
                            table.constraints.push(constraint);
                        }
                    }
                    None => skip_clause(name, clause, warnings),
                }
                continue;
            }

            match parse_column(clause) {
                Some(parsed) => {
                    if parsed.column.primary_key {
                        inline_pk.push(parsed.column.name.clone());
                    }
                    if parsed.column.unique {
                        table.constraints.push(Constraint::new(
                            ConstraintKind::Unique,
                            vec![parsed.column.name.clone()],
                        ));
                    }
                    if let Some(fk) = parsed.foreign_key {
                        let mut constraint = Constraint::new(
                            ConstraintKind::ForeignKey,
                            vec![fk.column.clone()],
                        );
                        constraint.references = Some(ConstraintReference {
                            table: fk.referenced_table.clone(),
                            columns: vec![fk.referenced_column.clone()],
                        });
                        table.constraints.push(constraint);
                        table.foreign_keys.push(fk);
                    }
                    if let Some(expression) = parsed.check {
                        let mut constraint = Constraint::new(
                            ConstraintKind::Check,
                            vec![parsed.column.name.clone()],
                        );
                        constraint.expression = Some(expression);
                        table.constraints.push(constraint);
                    }
                    table.columns.push(parsed.column);
                }
                None => skip_clause(name, clause, warnings),
            }
        }

        let pk_constraint = match table_pk {
            Some(constraint) => Some(constraint),
            None if !inline_pk.is_empty() => {
                Some(Constraint::new(ConstraintKind::PrimaryKey, inline_pk))
            }
            None => None,
        };

        if let Some(pk) = pk_constraint {
            for column_name in &pk.columns {
                if let Some(column) = table.get_column_mut(column_name) {
                    column.primary_key = true;
                    column.nullable = false;
                }
            }
            table.primary_keys = pk.columns.clone();
            table.constraints.insert(0, pk);
        }

        for constraint in &table.constraints {
            if constraint.kind == ConstraintKind::Unique && constraint.columns.len() == 1 {
                if let Some(column) = table
                    .columns
                    .iter_mut()
                    .find(|c| c.is_named(&constraint.columns[0]))
                {
                    column.unique = true;
                }
            }
        }

        table
    }
}

fn skip_clause(table: &str, clause: &str, warnings: &mut Vec<String>) {
    let msg = format!("{}: skipped unparsable clause '{}'", table, clause);
    tracing::warn!("{}", msg);
    warnings.push(msg);
}

impl BackupParser for SqlParser {
    fn parse(
        &self,
        content: &[u8],
        selected_tables: Option<&[String]>,
    ) -> ImportResult<SourceSchema> {
        let sql = String::from_utf8_lossy(content);
        Ok(self.parse_sql(&sql, selected_tables))
    }

    fn format(&self) -> BackupFormat {
        BackupFormat::Sql
    }
}
