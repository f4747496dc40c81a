//! CSV output format.

use krxfeed_types::{RowSet, value_text};
use std::io::Write;

use crate::{FormatError, Formatter};

/// CSV formatter.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: char,
    /// Whether to include header row.
    include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a new CSV formatter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: '\t',
            include_header: true,
        }
    }

    /// Quotes a field if it holds the delimiter, a quote or a line break.
    fn escape(&self, field: &str) -> String {
        if field.contains([self.delimiter, '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn write_line<W: Write>(
        &self,
        writer: &mut W,
        fields: impl Iterator<Item = String>,
    ) -> Result<(), FormatError> {
        let line: Vec<String> = fields.map(|field| self.escape(&field)).collect();
        writeln!(writer, "{}", line.join(&self.delimiter.to_string()))?;
        Ok(())
    }
}

impl Formatter for CsvFormatter {
    fn write_rows<W: Write>(&self, rows: &RowSet, mut writer: W) -> Result<(), FormatError> {
        let columns = rows.columns();

        if self.include_header && !columns.is_empty() {
            self.write_line(&mut writer, columns.iter().cloned())?;
        }

        for row in rows.rows() {
            self.write_line(
                &mut writer,
                columns
                    .iter()
                    .map(|column| row.get(column).map(value_text).unwrap_or_default()),
            )?;
        }

        Ok(())
    }

    fn extension(&self) -> &str {
        if self.delimiter == '\t' { "tsv" } else { "csv" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krxfeed_types::Row;
    use serde_json::json;
    use std::io::Cursor;

    fn create_test_rows() -> RowSet {
        let rows: Vec<Row> = [
            json!({"ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", "TDD_CLSPRC": "81,000"}),
            json!({"ISU_SRT_CD": "000660", "ISU_ABBRV": "SK하이닉스", "TDD_CLSPRC": "126,000"}),
        ]
        .into_iter()
        .filter_map(|value| value.as_object().cloned())
        .collect();
        RowSet::new("OutBlock_1", rows)
    }

    fn render(formatter: &CsvFormatter, rows: &RowSet) -> String {
        let mut output = Cursor::new(Vec::new());
        formatter.write_rows(rows, &mut output).unwrap();
        String::from_utf8(output.into_inner()).unwrap()
    }

    #[test]
    fn test_csv_rows() {
        let result = render(&CsvFormatter::new(), &create_test_rows());
        let lines: Vec<_> = result.lines().collect();

        assert_eq!(lines[0], "ISU_SRT_CD,ISU_ABBRV,TDD_CLSPRC");
        // Thousands separators force quoting
        assert_eq!(lines[1], "005930,삼성전자,\"81,000\"");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_no_header() {
        let formatter = CsvFormatter::new().with_header(false);
        let result = render(&formatter, &create_test_rows());
        assert!(!result.contains("ISU_SRT_CD"));
        assert_eq!(result.lines().count(), 2);
    }

    #[test]
    fn test_tsv() {
        let formatter = CsvFormatter::tsv();
        let result = render(&formatter, &create_test_rows());
        assert!(result.starts_with("ISU_SRT_CD\tISU_ABBRV\tTDD_CLSPRC\n"));
        assert!(result.contains("005930\t삼성전자\t81,000"));
        assert_eq!(formatter.extension(), "tsv");
    }

    #[test]
    fn test_quotes_are_doubled() {
        let mut row = Row::new();
        row.insert("name".to_string(), json!("say \"hi\""));
        row.insert("price".to_string(), json!(null));
        let result = render(&CsvFormatter::new(), &RowSet::new("b", vec![row]));
        assert!(result.ends_with("\"say \"\"hi\"\"\",\n"));
    }

    #[test]
    fn test_empty_rows() {
        let result = render(&CsvFormatter::new(), &RowSet::empty("b"));
        assert!(result.is_empty());
    }
}
