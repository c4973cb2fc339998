//! Builders for the SQL statements issued per table.
//!
//! Table and column names are interpolated verbatim (no quoting, no case
//! folding), so every statement is gated on the configured table list.

use crate::domain::entities::ColumnDescriptor;
use crate::domain::errors::{ExportError, Result};

/// Synthesizes the statements for tables on an allow-list.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    allowed: Vec<String>,
}

impl QueryBuilder {
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed: allowed.to_vec(),
        }
    }

    fn check_allowed(&self, table: &str) -> Result<()> {
        if self.allowed.iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(ExportError::QueryBuildFailed {
                table: table.to_string(),
                reason: "table is not in the configured table list".to_string(),
            })
        }
    }

    /// `SHOW FULL COLUMNS FROM <table>`, used for schema introspection.
    pub fn describe_columns(&self, table: &str) -> Result<String> {
        self.check_allowed(table)?;
        Ok(format!("SHOW FULL COLUMNS FROM {}", table))
    }

    /// `SELECT c1, c2, ..., cN FROM <table>;` in descriptor order.
    pub fn build_select(&self, columns: &[ColumnDescriptor], table: &str) -> Result<String> {
        self.check_allowed(table)?;
        if columns.is_empty() {
            return Err(ExportError::QueryBuildFailed {
                table: table.to_string(),
                reason: "table has no columns".to_string(),
            });
        }

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        Ok(format!("SELECT {} FROM {};", names.join(", "), table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(&["users".to_string(), "Orders".to_string()])
    }

    #[test]
    fn test_build_select_keeps_column_order() {
        let cols = vec![
            ColumnDescriptor::new("id", "int(11)"),
            ColumnDescriptor::new("name", "varchar(64)"),
            ColumnDescriptor::new("email", "varchar(255)"),
        ];
        let sql = builder().build_select(&cols, "users").unwrap();
        assert_eq!(sql, "SELECT id, name, email FROM users;");
    }

    #[test]
    fn test_single_column() {
        let cols = vec![ColumnDescriptor::new("ID", "int")];
        let sql = builder().build_select(&cols, "Orders").unwrap();
        assert_eq!(sql, "SELECT ID FROM Orders;");
    }

    #[test]
    fn test_identifiers_passed_verbatim() {
        let cols = vec![ColumnDescriptor::new("`Order Id`", "int")];
        let sql = builder().build_select(&cols, "Orders").unwrap();
        assert_eq!(sql, "SELECT `Order Id` FROM Orders;");
    }

    #[test]
    fn test_many_columns() {
        let cols: Vec<ColumnDescriptor> = (0..150)
            .map(|i| ColumnDescriptor::new(format!("c{}", i), "int"))
            .collect();
        let sql = builder().build_select(&cols, "users").unwrap();
        assert!(sql.starts_with("SELECT c0, c1, "));
        assert!(sql.ends_with("c148, c149 FROM users;"));
        assert_eq!(sql.matches(", ").count(), 149);
    }

    #[test]
    fn test_rejects_unlisted_table() {
        let cols = vec![ColumnDescriptor::new("id", "int")];
        let err = builder()
            .build_select(&cols, "users; DROP TABLE users")
            .unwrap_err();
        assert!(matches!(err, ExportError::QueryBuildFailed { .. }));

        // Allow-list matching is exact.
        assert!(builder().build_select(&cols, "orders").is_err());
        assert!(builder().describe_columns("accounts").is_err());
    }

    #[test]
    fn test_rejects_empty_columns() {
        let err = builder().build_select(&[], "users").unwrap_err();
        assert!(err.to_string().contains("no columns"));
    }

    #[test]
    fn test_describe_columns() {
        assert_eq!(
            builder().describe_columns("users").unwrap(),
            "SHOW FULL COLUMNS FROM users"
        );
    }
}
