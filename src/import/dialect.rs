//! SQL dialect detection
//!
//! Scores dump text against lexical signatures of each supported dialect.

use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ImportError, ImportResult};

/// Bytes sampled by [`detect_dialect_from_file`]
pub const FILE_SAMPLE_BYTES: u64 = 100 * 1024;

/// SQL dialect of a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Postgresql,
    Mysql,
    Oracle,
    Firebird,
    #[default]
    Unknown,
}

impl SqlDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Postgresql => "postgresql",
            SqlDialect::Mysql => "mysql",
            SqlDialect::Oracle => "oracle",
            SqlDialect::Firebird => "firebird",
            SqlDialect::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::Postgresql),
            "mysql" | "mariadb" => Ok(SqlDialect::Mysql),
            "oracle" => Ok(SqlDialect::Oracle),
            "firebird" => Ok(SqlDialect::Firebird),
            "unknown" => Ok(SqlDialect::Unknown),
            other => Err(ImportError::Parse(format!("Unknown SQL dialect: {}", other))),
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect()
}

/// Signatures per dialect, in tie-break order
static SIGNATURES: Lazy<Vec<(SqlDialect, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            SqlDialect::Postgresql,
            compile(&[
                r"\bSERIAL\b",
                r"\bBIGSERIAL\b",
                r"\bUUID\b",
                r"(?s)\bCREATE\s+TABLE.*USING\s+btree",
                r"ON\s+CONFLICT",
                r"\bENUM\s*\(",
                r"\\d\+",
                r"\bGENERATED\s+ALWAYS\b",
            ]),
        ),
        (
            SqlDialect::Mysql,
            compile(&[
                r"AUTO_INCREMENT",
                r"ENGINE\s*=\s*\w+",
                r"COLLATE\s+\w+",
                r"`\w+`\s*[\s,]",
                r"CHARACTER\s+SET",
                r"COLLATION",
                r"AUTOINCREMENT",
            ]),
        ),
        (
            SqlDialect::Oracle,
            compile(&[
                r"\bNUMBER\s*\(",
                r"\bCLOB\b",
                r"\bBLOB\b",
                r"\bCREATE\s+SEQUENCE",
                r"\bSTART\s+WITH",
                r"NEXTVAL",
                r"\bSYSDATE\b",
                r"\bTO_DATE\b",
                r"\bTO_CHAR\b",
            ]),
        ),
        (
            SqlDialect::Firebird,
            compile(&[
                r"BLOB\s+SUB_TYPE",
                r"SEGMENT\s+SIZE",
                r"COMPUTED\s+BY",
                r"BEFORE\s+(?:INSERT|UPDATE|DELETE)",
                r"COLLATE\s+\w+",
                r"\bDATABASE\b",
            ]),
        ),
    ]
});

/// Lexical SQL dialect detector
pub struct DialectDetector;

impl DialectDetector {
    /// Number of matching signatures per dialect, in tie-break order
    pub fn scores(sql: &str) -> Vec<(SqlDialect, usize)> {
        SIGNATURES
            .iter()
            .map(|(dialect, patterns)| {
                let score = patterns.iter().filter(|re| re.is_match(sql)).count();
                (*dialect, score)
            })
            .collect()
    }

    /// Highest-scoring dialect; earlier dialects win ties, all-zero is unknown
    pub fn detect(sql: &str) -> SqlDialect {
        let mut best = (SqlDialect::Unknown, 0);
        for (dialect, score) in Self::scores(sql) {
            if score > best.1 {
                best = (dialect, score);
            }
        }
        tracing::debug!("Detected SQL dialect {} (score {})", best.0, best.1);
        best.0
    }
}

/// Detect the dialect of a dump file from its first 100 KiB
pub fn detect_dialect_from_file(path: impl AsRef<Path>) -> ImportResult<SqlDialect> {
    let path = path.as_ref();
    let io_err = |source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let mut buf = Vec::new();
    file.take(FILE_SAMPLE_BYTES)
        .read_to_end(&mut buf)
        .map_err(io_err)?;

    Ok(DialectDetector::detect(&String::from_utf8_lossy(&buf)))
}
