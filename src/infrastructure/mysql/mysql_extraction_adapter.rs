//! Infrastructure adapter for materializing MySQL query results as text rows.

use crate::domain::cell::{BinaryFormat, Cell, CellKind};
use crate::domain::entities::{ColumnDescriptor, RowSet};
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::mysql::connection_manager::MysqlConnection;
use crate::infrastructure::mysql::row_values;
use crate::ports::extraction_port::ExtractionPort;
use log::debug;
use mysql::prelude::Queryable;
use mysql::Value;
use std::sync::Arc;
use std::time::Instant;

/// Concrete implementation of `ExtractionPort` for MySQL.
///
/// Executes the generated `SELECT` over the text protocol, classifies each
/// value by its column's declared type and renders it to a string. The cursor
/// is drained inside `materialize`, so the shared connection is free for the
/// next table's statements when this returns.
pub struct MysqlExtractionAdapter {
    connection: Arc<MysqlConnection>,
    binary_format: BinaryFormat,
}

impl MysqlExtractionAdapter {
    pub fn new(connection: Arc<MysqlConnection>, binary_format: BinaryFormat) -> Self {
        Self {
            connection,
            binary_format,
        }
    }
}

impl ExtractionPort for MysqlExtractionAdapter {
    fn materialize(
        &self,
        table: &str,
        query: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<RowSet> {
        let start_time = Instant::now();
        let kinds: Vec<CellKind> = columns.iter().map(|c| c.cell_kind()).collect();
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        let rows = self.connection.with_conn(|conn| {
            let result = conn
                .query_iter(query)
                .map_err(|e| ExportError::query(table, e))?;
            collect_rows(
                table,
                result.map(|row| row.map(row_values)),
                &kinds,
                &names,
                self.binary_format,
            )
        })?;

        debug!(
            "{}: {} rows materialized in {:.2}s",
            table,
            rows.row_count(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(rows)
    }
}

/// Renders every row of a result cursor into a `RowSet`.
///
/// A cell that cannot be converted leaves an empty field and a scan failure
/// on its row. A driver error ends the cursor, so it fails the whole table
/// instead of yielding a silently truncated export.
pub fn collect_rows<I, E>(
    table: &str,
    rows: I,
    kinds: &[CellKind],
    names: &[String],
    binary_format: BinaryFormat,
) -> Result<RowSet>
where
    I: Iterator<Item = std::result::Result<Vec<Value>, E>>,
    E: std::fmt::Display,
{
    let mut set = RowSet::new(names.to_vec());

    for (index, row_res) in rows.enumerate() {
        let values = row_res.map_err(|e| {
            ExportError::query(table, format!("result cursor failed at row {}: {}", index, e))
        })?;

        let (cells, problems) = render_row(values, kinds, names, binary_format);
        let width = cells.len();
        if !set.push_row(cells) {
            set.record_scan_failure(
                index,
                format!("expected {} cells, got {}", names.len(), width),
            );
        }
        for problem in problems {
            set.record_scan_failure(index, problem);
        }
    }

    Ok(set)
}

/// Renders one row. Cells that fail to convert become empty strings and are
/// reported in the second element of the tuple.
pub fn render_row(
    values: Vec<Value>,
    kinds: &[CellKind],
    names: &[String],
    binary_format: BinaryFormat,
) -> (Vec<String>, Vec<String>) {
    let mut cells = Vec::with_capacity(values.len());
    let mut problems = Vec::new();

    for (i, value) in values.into_iter().enumerate() {
        let kind = kinds.get(i).copied().unwrap_or(CellKind::Text);
        match cell_from_value(kind, value) {
            Ok(cell) => cells.push(cell.render(binary_format).into_owned()),
            Err(reason) => {
                let column = names.get(i).map(String::as_str).unwrap_or("?");
                problems.push(format!("column {}: {}", column, reason));
                cells.push(String::new());
            }
        }
    }

    (cells, problems)
}

/// Maps a driver value onto the closed cell variant for its column.
pub fn cell_from_value(kind: CellKind, value: Value) -> std::result::Result<Cell, String> {
    match value {
        Value::NULL => Ok(Cell::Null),
        Value::Bytes(bytes) => Cell::from_bytes(kind, bytes),
        Value::Int(i) => Ok(Cell::from_text(kind, i.to_string())),
        Value::UInt(u) => Ok(Cell::from_text(kind, u.to_string())),
        Value::Float(f) => Ok(Cell::from_text(kind, f.to_string())),
        Value::Double(d) => Ok(Cell::from_text(kind, d.to_string())),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            Ok(Cell::from_text(kind, text))
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            let mut text = format!(
                "{}{:02}:{:02}:{:02}",
                if negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds
            );
            if micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            Ok(Cell::from_text(kind, text))
        }
    }
}
