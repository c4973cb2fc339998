//! Infrastructure adapter for reading MySQL column metadata.

use crate::domain::entities::{ColumnDescriptor, KeyRole};
use crate::domain::errors::{ExportError, Result};
use crate::domain::query_builder::QueryBuilder;
use crate::infrastructure::mysql::connection_manager::MysqlConnection;
use crate::infrastructure::mysql::row_values;
use crate::ports::metadata_port::MetadataPort;
use log::debug;
use mysql::prelude::Queryable;
use mysql::{from_value_opt, Value};
use std::sync::Arc;

/// Number of columns in a `SHOW FULL COLUMNS` result row:
/// Field, Type, Collation, Null, Key, Default, Extra, Privileges, Comment.
const SHOW_FULL_COLUMNS_WIDTH: usize = 9;

/// Concrete implementation of `MetadataPort` for MySQL.
///
/// Uses `SHOW FULL COLUMNS`, which reports columns in their declared order.
pub struct MysqlMetadataAdapter {
    connection: Arc<MysqlConnection>,
    queries: QueryBuilder,
}

impl MysqlMetadataAdapter {
    pub fn new(connection: Arc<MysqlConnection>, queries: QueryBuilder) -> Self {
        Self {
            connection,
            queries,
        }
    }
}

impl MetadataPort for MysqlMetadataAdapter {
    fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let sql = self
            .queries
            .describe_columns(table)
            .map_err(|e| ExportError::introspection(table, e))?;

        let columns = self
            .connection
            .with_conn(|conn| {
                let result = conn.query_iter(&sql)?;
                let mut columns = Vec::new();
                for row_res in result {
                    let row = row_res?;
                    let descriptor = descriptor_from_values(row_values(row))
                        .map_err(|reason| ExportError::introspection(table, reason))?;
                    columns.push(descriptor);
                }
                Ok(columns)
            })
            .map_err(|e| match e {
                ExportError::IntrospectionFailed { .. } => e,
                other => ExportError::introspection(table, other),
            })?;

        if columns.is_empty() {
            return Err(ExportError::introspection(table, "no columns reported"));
        }
        debug!("{}: {} columns", table, columns.len());
        Ok(columns)
    }
}

fn text(value: Value, field: &str) -> std::result::Result<String, String> {
    from_value_opt::<String>(value).map_err(|e| format!("{}: {}", field, e))
}

fn opt_text(value: Value, field: &str) -> std::result::Result<Option<String>, String> {
    match value {
        Value::NULL => Ok(None),
        other => text(other, field).map(Some),
    }
}

/// Converts one `SHOW FULL COLUMNS` row into a descriptor.
pub fn descriptor_from_values(values: Vec<Value>) -> std::result::Result<ColumnDescriptor, String> {
    if values.len() < SHOW_FULL_COLUMNS_WIDTH {
        return Err(format!(
            "expected {} metadata fields, got {}",
            SHOW_FULL_COLUMNS_WIDTH,
            values.len()
        ));
    }

    let mut it = values.into_iter();
    let mut next = || it.next().unwrap_or(Value::NULL);

    let name = text(next(), "Field")?;
    let declared_type = text(next(), "Type")?;
    let collation = opt_text(next(), "Collation")?;
    let nullable = text(next(), "Null")?.eq_ignore_ascii_case("YES");
    let key = KeyRole::from_mysql(&opt_text(next(), "Key")?.unwrap_or_default());
    let default = opt_text(next(), "Default")?;
    let extra = opt_text(next(), "Extra")?.unwrap_or_default();
    let privileges = opt_text(next(), "Privileges")?.unwrap_or_default();
    let comment = opt_text(next(), "Comment")?.unwrap_or_default();

    Ok(ColumnDescriptor {
        name,
        declared_type,
        collation,
        nullable,
        key,
        default,
        extra,
        privileges,
        comment,
    })
}
