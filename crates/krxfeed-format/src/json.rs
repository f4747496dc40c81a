//! JSON output format.

use krxfeed_types::RowSet;
use std::io::Write;

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// JSON array (standard JSON).
    #[default]
    Array,
    /// Newline-delimited JSON (NDJSON/JSONL).
    Ndjson,
}

/// JSON formatter.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Output style.
    style: JsonStyle,
    /// Whether to pretty-print (only for array style).
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default settings (array style).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            pretty: false,
        }
    }

    /// Creates a new NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self {
            style: JsonStyle::Ndjson,
            pretty: false,
        }
    }

    /// Sets whether to pretty-print output (array style only).
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }
}

impl Formatter for JsonFormatter {
    fn write_rows<W: Write>(&self, rows: &RowSet, mut writer: W) -> Result<(), FormatError> {
        match self.style {
            JsonStyle::Array => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut writer, rows.rows())?;
                } else {
                    serde_json::to_writer(&mut writer, rows.rows())?;
                }
                writeln!(writer)?;
            }
            JsonStyle::Ndjson => {
                for row in rows.rows() {
                    serde_json::to_writer(&mut writer, row)?;
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;
    use chrono::NaiveDate;
    use krxfeed_types::{Market, Row, SecurityRecord};
    use serde_json::{Value, json};
    use std::io::{Cursor, Read};

    fn create_test_rows() -> RowSet {
        let rows: Vec<Row> = ["2021/01/05", "2021/01/04"]
            .iter()
            .map(|date| {
                let mut row = Row::new();
                row.insert("TRD_DD".to_string(), json!(date));
                row.insert("CLSPRC_IDX".to_string(), json!("2,990.57"));
                row
            })
            .collect();
        RowSet::new("output", rows)
    }

    fn render(formatter: &JsonFormatter, rows: &RowSet) -> String {
        let mut output = Cursor::new(Vec::new());
        formatter.write_rows(rows, &mut output).unwrap();
        String::from_utf8(output.into_inner()).unwrap()
    }

    #[test]
    fn test_json_array() {
        let result = render(&JsonFormatter::new(), &create_test_rows());
        assert!(result.starts_with('['));
        assert!(result.contains("\"TRD_DD\":\"2021/01/05\""));

        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_ndjson() {
        let formatter = JsonFormatter::ndjson();
        let result = render(&formatter, &create_test_rows());

        let lines: Vec<_> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"TRD_DD\""));
        assert_eq!(formatter.extension(), "ndjson");
    }

    #[test]
    fn test_pretty_json() {
        let formatter = JsonFormatter::new().with_pretty(true);
        let result = render(&formatter, &create_test_rows());
        assert!(result.contains('\n'));
        assert!(result.contains("  ")); // Indentation
    }

    #[test]
    fn test_records_to_file() {
        let records = [
            SecurityRecord::new("005930", "KR7005930003", "삼성전자", Market::Kospi, None),
            SecurityRecord::new(
                "107590",
                "KR7107590003",
                "미원홀딩스",
                Market::Kospi,
                NaiveDate::from_ymd_opt(2015, 1, 1),
            ),
        ];
        let mut file = tempfile::tempfile().unwrap();
        OutputFormat::Ndjson
            .write_records(&records, &mut file)
            .unwrap();

        let mut written = String::new();
        std::io::Seek::rewind(&mut file).unwrap();
        file.read_to_string(&mut written).unwrap();

        let first: Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
        assert_eq!(first["ticker"], "005930");
        assert_eq!(first["delist_date"], Value::Null);
        assert_eq!(written.lines().count(), 2);
    }
}
