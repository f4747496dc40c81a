//! Decoded response blocks.

use serde_json::{Map, Value};
use tracing::warn;

use crate::{KrxError, Result};

/// One row of a response block, keyed by the exchange's field names.
pub type Row = Map<String, Value>;

/// The ordered rows of one named block of an exchange response.
///
/// Row order is the order the exchange produced (or, for paged endpoints,
/// row-index order) and is meaningful to callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    block: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RowSet {
    /// Creates a row-set, taking the column order from the first row.
    #[must_use]
    pub fn new(block: impl Into<String>, rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            block: block.into(),
            columns,
            rows,
        }
    }

    /// Creates an empty row-set for the given block.
    #[must_use]
    pub fn empty(block: impl Into<String>) -> Self {
        Self::new(block, Vec::new())
    }

    /// Converts "no data" errors into an empty row-set.
    ///
    /// Empty blocks pass silently; format errors are logged and degraded so a
    /// batch job keeps running. Every other error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the original error unless [`KrxError::is_no_data`] holds for it.
    pub fn or_empty(result: Result<Self>, block: &str) -> Result<Self> {
        match result {
            Ok(rows) => Ok(rows),
            Err(KrxError::EmptyResult { .. }) => Ok(Self::empty(block)),
            Err(KrxError::UpstreamFormat(reason)) => {
                warn!(block, %reason, "degrading malformed response to an empty table");
                Ok(Self::empty(block))
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the block name.
    #[must_use]
    pub fn block(&self) -> &str {
        &self.block
    }

    /// Returns the column names in first-row order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the row-set, returning the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the values of one column as text, one entry per row.
    ///
    /// Rows missing the field yield an empty string.
    pub fn column_text<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(name).map(value_text).unwrap_or_default())
    }
}

/// Renders a cell as plain text: strings unquoted, null as empty, everything else as JSON.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_columns_follow_first_row() {
        let rows = vec![
            row(json!({"TRD_DD": "2021/01/04", "CLSPRC_IDX": "2,944.45"})),
            row(json!({"TRD_DD": "2021/01/05", "CLSPRC_IDX": "2,990.57"})),
        ];
        let set = RowSet::new("output", rows);

        assert_eq!(set.columns(), ["TRD_DD", "CLSPRC_IDX"]);
        assert_eq!(set.len(), 2);
        let dates: Vec<_> = set.column_text("TRD_DD").collect();
        assert_eq!(dates, ["2021/01/04", "2021/01/05"]);
    }

    #[test]
    fn test_or_empty_degrades_no_data() {
        let empty = RowSet::or_empty(
            Err(KrxError::EmptyResult {
                block: "output".into(),
            }),
            "output",
        )
        .unwrap();
        assert!(empty.is_empty());

        let broken = RowSet::or_empty(Err(KrxError::UpstreamFormat("x".into())), "output").unwrap();
        assert_eq!(broken.block(), "output");
    }

    #[test]
    fn test_or_empty_keeps_real_errors() {
        let result = RowSet::or_empty(Err(KrxError::Rejected { status: 403 }), "output");
        assert!(matches!(result, Err(KrxError::Rejected { status: 403 })));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("abc")), "abc");
        assert_eq!(value_text(&json!(12)), "12");
        assert_eq!(value_text(&Value::Null), "");
    }
}
