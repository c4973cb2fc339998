//! MySQL adapters and the shared connection they run on.

pub mod connection_manager;
pub mod mysql_extraction_adapter;
pub mod mysql_metadata_adapter;

use mysql::{Row, Value};

/// Moves every value out of a result row, in column order.
pub(crate) fn row_values(mut row: Row) -> Vec<Value> {
    (0..row.len())
        .map(|i| row.take::<Value, usize>(i).unwrap_or(Value::NULL))
        .collect()
}
