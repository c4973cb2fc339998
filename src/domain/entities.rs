//! # Domain Entities
//!
//! Entities are the "Nouns" of the exporter: the job being run, the columns
//! of a table, the rows pulled out of it, and the outcome of each table.
//!
//! We use the `serde` crate (Serialize/Deserialize) on the metadata types so
//! they can be dumped to JSON when debugging a run.

use crate::domain::cell::CellKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Credentials and endpoint of the source database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

// Hand-written so the password never ends up in a log line.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// `ExportJob` is one run of the exporter.
///
/// It is built once from the configuration and never mutated afterwards.
/// The table list doubles as the allow-list for every SQL statement that
/// interpolates a table name.
#[derive(Debug, Clone)]
pub struct ExportJob {
    connection: ConnectionParams,
    tables: Vec<String>,
}

impl ExportJob {
    pub fn new(connection: ConnectionParams, tables: Vec<String>) -> Self {
        Self { connection, tables }
    }

    pub fn connection(&self) -> &ConnectionParams {
        &self.connection
    }

    /// Tables in the order they will be exported.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }
}

/// Role of a column in the table's keys, as reported in the `Key` column of
/// `SHOW FULL COLUMNS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    None,
    Primary,
    Unique,
    Multiple,
}

impl KeyRole {
    pub fn from_mysql(key: &str) -> Self {
        match key.trim().to_ascii_uppercase().as_str() {
            "PRI" => KeyRole::Primary,
            "UNI" => KeyRole::Unique,
            "MUL" => KeyRole::Multiple,
            _ => KeyRole::None,
        }
    }
}

/// `ColumnDescriptor` represents one column of one table.
///
/// Descriptors are kept in the database's native column order; that order
/// drives both the generated `SELECT` and the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// The name of the column (e.g., "email").
    pub name: String,
    /// The type as declared in the DDL (e.g., "varchar(255)").
    pub declared_type: String,
    pub collation: Option<String>,
    pub nullable: bool,
    pub key: KeyRole,
    pub default: Option<String>,
    /// Extra attributes such as `auto_increment`.
    pub extra: String,
    pub privileges: String,
    pub comment: String,
}

impl ColumnDescriptor {
    /// Minimal descriptor used by tests and mocks.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            collation: None,
            nullable: true,
            key: KeyRole::None,
            default: None,
            extra: String::new(),
            privileges: String::new(),
            comment: String::new(),
        }
    }

    pub fn cell_kind(&self) -> CellKind {
        CellKind::from_declared_type(&self.declared_type)
    }
}

/// A row that could not be read cleanly from the result cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    /// Zero-based index of the row within the result set.
    pub row: usize,
    pub reason: String,
}

/// `RowSet` is the materialized, already-rendered result of a table query.
///
/// Every stored row has exactly `columns().len()` cells. Short rows are
/// padded with empty cells and long rows are truncated; either case is
/// reported to the caller through `push_row`.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    scan_failures: Vec<ScanFailure>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            scan_failures: Vec::new(),
        }
    }

    /// Appends a row, forcing it to the column count.
    ///
    /// Returns `false` when the row had to be padded or truncated.
    pub fn push_row(&mut self, mut cells: Vec<String>) -> bool {
        let width = self.columns.len();
        let aligned = cells.len() == width;
        cells.resize(width, String::new());
        self.rows.push(cells);
        aligned
    }

    pub fn record_scan_failure(&mut self, row: usize, reason: impl Into<String>) {
        self.scan_failures.push(ScanFailure {
            row,
            reason: reason.into(),
        });
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn scan_failures(&self) -> &[ScanFailure] {
        &self.scan_failures
    }
}

/// The stages a single table goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Introspecting,
    QueryBuilding,
    Querying,
    Writing,
    Transcoding,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportStage::Introspecting => "introspect",
            ExportStage::QueryBuilding => "build-query",
            ExportStage::Querying => "query",
            ExportStage::Writing => "write",
            ExportStage::Transcoding => "transcode",
        };
        f.write_str(name)
    }
}

/// Why and where a table export stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: ExportStage,
    pub table: String,
    pub reason: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.table, self.reason)
    }
}

/// `ExportOutcome` is the "Report Card" for one table.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// The legacy-encoded file is ready to be archived.
    Success { output: PathBuf, rows: usize },
    Failure(StageFailure),
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportOutcome::Success { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub outcome: ExportOutcome,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reports: Vec<TableReport>,
    pub archive: PathBuf,
    /// Present only when at least one failure was recorded.
    pub log_file: Option<PathBuf>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    pub fn total_rows(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match &r.outcome {
                ExportOutcome::Success { rows, .. } => *rows,
                ExportOutcome::Failure(_) => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_set_alignment() {
        let mut set = RowSet::new(vec!["id".into(), "name".into(), "email".into()]);
        assert!(set.push_row(vec!["1".into(), "kim".into(), "k@x".into()]));
        assert!(!set.push_row(vec!["2".into()]));
        assert!(!set.push_row(vec!["3".into(), "a".into(), "b".into(), "extra".into()]));

        assert_eq!(set.row_count(), 3);
        assert!(set.rows().iter().all(|r| r.len() == 3));
        assert_eq!(set.rows()[1], vec!["2", "", ""]);
        assert_eq!(set.rows()[2], vec!["3", "a", "b"]);
    }

    #[test]
    fn test_key_role_parsing() {
        assert_eq!(KeyRole::from_mysql("PRI"), KeyRole::Primary);
        assert_eq!(KeyRole::from_mysql("uni"), KeyRole::Unique);
        assert_eq!(KeyRole::from_mysql("MUL"), KeyRole::Multiple);
        assert_eq!(KeyRole::from_mysql(""), KeyRole::None);
    }

    #[test]
    fn test_connection_debug_hides_password() {
        let params = ConnectionParams {
            host: "db".into(),
            port: 3306,
            user: "app".into(),
            password: "s3cret".into(),
            database: "shop".into(),
        };
        let dbg = format!("{:?}", params);
        assert!(!dbg.contains("s3cret"));
        assert_eq!(params.to_string(), "app@db:3306/shop");
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            reports: vec![
                TableReport {
                    table: "a".into(),
                    outcome: ExportOutcome::Success {
                        output: PathBuf::from("a.csv"),
                        rows: 3,
                    },
                },
                TableReport {
                    table: "b".into(),
                    outcome: ExportOutcome::Failure(StageFailure {
                        stage: ExportStage::Querying,
                        table: "b".into(),
                        reason: "boom".into(),
                    }),
                },
            ],
            archive: PathBuf::from("result.zip"),
            log_file: None,
        };
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_rows(), 3);
    }
}
