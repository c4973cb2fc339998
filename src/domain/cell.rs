//! # Cell Rendering
//!
//! Every value read from a result set is classified into a closed set of
//! variants before it is turned into text. The variant is picked from the
//! column's declared type (as reported by `SHOW FULL COLUMNS`), not from the
//! runtime shape of the value, so the same column always renders the same way.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// The rendering family of a column, derived from its declared MySQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Text,
    Number,
    DateTime,
    Binary,
}

impl CellKind {
    /// Classifies a declared type such as `int(11) unsigned`, `varchar(64)`
    /// or `datetime(6)`.
    pub fn from_declared_type(declared: &str) -> Self {
        let lower = declared.trim().to_ascii_lowercase();
        let base = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("");

        match base {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "decimal"
            | "dec" | "numeric" | "fixed" | "float" | "double" | "real" => CellKind::Number,
            "date" | "datetime" | "timestamp" | "time" | "year" => CellKind::DateTime,
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bit"
            | "geometry" | "point" | "linestring" | "polygon" | "multipoint"
            | "multilinestring" | "multipolygon" | "geometrycollection" => CellKind::Binary,
            _ => CellKind::Text,
        }
    }
}

/// How `Binary` cells are written into the CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryFormat {
    /// Bytes interpreted as UTF-8, invalid sequences replaced with U+FFFD,
    /// which most legacy encodings cannot represent.
    Raw,
    /// Standard alphabet with padding; plain ASCII in every target encoding.
    #[default]
    Base64,
}

/// A single typed value from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(String),
    DateTime(String),
    Binary(Vec<u8>),
}

impl Cell {
    /// Builds a cell of the given kind from raw driver bytes.
    ///
    /// Textual kinds require valid UTF-8; the error string describes the
    /// offending column value so the caller can record a scan failure.
    pub fn from_bytes(kind: CellKind, bytes: Vec<u8>) -> std::result::Result<Cell, String> {
        if kind == CellKind::Binary {
            return Ok(Cell::Binary(bytes));
        }
        let text = String::from_utf8(bytes)
            .map_err(|e| format!("invalid UTF-8 in {:?} value: {}", kind, e))?;
        Ok(Cell::from_text(kind, text))
    }

    /// Wraps an already textual value in the variant for `kind`.
    pub fn from_text(kind: CellKind, text: String) -> Cell {
        match kind {
            CellKind::Text => Cell::Text(text),
            CellKind::Number => Cell::Number(text),
            CellKind::DateTime => Cell::DateTime(text),
            CellKind::Binary => Cell::Binary(text.into_bytes()),
        }
    }

    /// Renders the cell for CSV output. `Null` is always the empty string.
    pub fn render(&self, binary_format: BinaryFormat) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Text(s) | Cell::Number(s) | Cell::DateTime(s) => Cow::Borrowed(s.as_str()),
            Cell::Binary(b) => match binary_format {
                BinaryFormat::Raw => String::from_utf8_lossy(b),
                BinaryFormat::Base64 => Cow::Owned(general_purpose::STANDARD.encode(b)),
            },
        }
    }
}
