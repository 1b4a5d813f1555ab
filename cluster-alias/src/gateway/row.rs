//! Statement arguments and named-column result rows.

use std::collections::HashMap;

/// A value bound to a statement placeholder or read from a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Floating point.
    Real(f64),
    /// UTF-8 text.
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row, addressed by column name.
///
/// Getters are lenient: a missing column or NULL reads as the type's empty
/// value, the way the directory's queries expect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    columns: HashMap<String, SqlValue>,
}

impl RowMap {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous one.
    pub fn insert(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.insert(column.into(), value);
    }

    /// Raw value of a column.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    /// Column as text; numbers are formatted, NULL and missing read as "".
    pub fn get_string(&self, column: &str) -> String {
        match self.columns.get(column) {
            Some(SqlValue::Text(text)) => text.clone(),
            Some(SqlValue::Integer(value)) => value.to_string(),
            Some(SqlValue::Real(value)) => value.to_string(),
            Some(SqlValue::Null) | None => String::new(),
        }
    }

    /// Column as an integer, or `None` when NULL, missing or unparsable.
    pub fn get_opt_i64(&self, column: &str) -> Option<i64> {
        match self.columns.get(column) {
            Some(SqlValue::Integer(value)) => Some(*value),
            Some(SqlValue::Real(value)) => Some(*value as i64),
            Some(SqlValue::Text(text)) => text.trim().parse().ok(),
            Some(SqlValue::Null) | None => None,
        }
    }

    /// Column as an integer, zero when absent.
    pub fn get_i64(&self, column: &str) -> i64 {
        self.get_opt_i64(column).unwrap_or(0)
    }

    /// Column as a boolean: any non-zero integer is true.
    pub fn get_bool(&self, column: &str) -> bool {
        self.get_i64(column) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RowMap {
        let mut row = RowMap::new();
        row.insert("cluster_name", SqlValue::from("db-1:3306"));
        row.insert("num_slave_hosts", SqlValue::Integer(3));
        row.insert("read_only", SqlValue::from(true));
        row.insert("last_seen", SqlValue::Null);
        row.insert("port_text", SqlValue::from("3306"));
        row
    }

    #[test]
    fn test_typed_getters() {
        let row = row();
        assert_eq!(row.get_string("cluster_name"), "db-1:3306");
        assert_eq!(row.get_i64("num_slave_hosts"), 3);
        assert!(row.get_bool("read_only"));
        assert_eq!(row.get_i64("port_text"), 3306);
        assert_eq!(row.get_string("num_slave_hosts"), "3");
    }

    #[test]
    fn test_null_and_missing_columns() {
        let row = row();
        assert_eq!(row.get_opt_i64("last_seen"), None);
        assert_eq!(row.get_string("last_seen"), "");
        assert_eq!(row.get_string("no_such_column"), "");
        assert!(!row.get_bool("no_such_column"));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(SqlValue::from(Some(7i64)), SqlValue::Integer(7));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
    }
}
