//! Writes a materialized table to a UTF-8 CSV file.

use crate::domain::errors::{ExportError, Result};
use crate::domain::export_options::LineEnding;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serializes a header row followed by the data rows.
///
/// Fields are quoted only when they contain the delimiter, a quote or a line
/// break; embedded quotes are doubled.
pub struct CsvTableWriter {
    line_ending: LineEnding,
}

impl CsvTableWriter {
    pub fn new(line_ending: LineEnding) -> Self {
        Self { line_ending }
    }

    fn terminator(&self) -> Terminator {
        match self.line_ending {
            LineEnding::Lf => Terminator::Any(b'\n'),
            LineEnding::Crlf => Terminator::CRLF,
        }
    }

    /// Writes `columns` then `rows` to `path`, replacing any existing file.
    ///
    /// The file is flushed, synced and closed before this returns; on error
    /// the handle is released by drop.
    pub fn write(&self, path: &Path, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
        let display = path.display().to_string();
        let file = File::create(path).map_err(|e| ExportError::write(&display, e))?;
        let buf_writer = BufWriter::with_capacity(128 * 1024, file);

        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(self.terminator())
            .from_writer(buf_writer);

        wtr.write_record(columns)
            .map_err(|e| ExportError::write(&display, e))?;
        for row in rows {
            wtr.write_record(row)
                .map_err(|e| ExportError::write(&display, e))?;
        }

        let buf_writer = wtr
            .into_inner()
            .map_err(|e| ExportError::write(&display, e.error()))?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| ExportError::write(&display, e.error()))?;
        file.sync_all().map_err(|e| ExportError::write(&display, e))?;

        Ok(())
    }
}
