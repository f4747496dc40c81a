//! Display utilities and output formatting for the krxfeed CLI.

use anyhow::{Context, Result};
use clap::ValueEnum;
use krxfeed_lib::prelude::*;
use krxfeed_lib::value_text;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Output format for rows and records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Aligned columns for the terminal
    Table,
    Csv,
    Tsv,
    Json,
    Ndjson,
}

impl Format {
    /// Returns the file format, or `None` for the terminal table.
    pub(crate) const fn output_format(self) -> Option<OutputFormat> {
        match self {
            Self::Table => None,
            Self::Csv => Some(OutputFormat::Csv),
            Self::Tsv => Some(OutputFormat::Tsv),
            Self::Json => Some(OutputFormat::Json),
            Self::Ndjson => Some(OutputFormat::Ndjson),
        }
    }
}

/// Where and how a command writes its result.
#[derive(Debug)]
pub(crate) struct Destination {
    format: Format,
    path: Option<PathBuf>,
}

impl Destination {
    pub(crate) const fn new(format: Format, path: Option<PathBuf>) -> Self {
        Self { format, path }
    }

    fn open(&self) -> Result<Box<dyn Write>> {
        Ok(match &self.path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        })
    }

    /// Writes a row-set.
    pub(crate) fn write_rows(&self, rows: &RowSet) -> Result<()> {
        let mut writer = self.open()?;
        match self.format.output_format() {
            Some(format) => format.write_rows(rows, &mut writer)?,
            None => write_table(rows, &mut writer)?,
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes security records.
    pub(crate) fn write_records(&self, records: &[&SecurityRecord]) -> Result<()> {
        let owned: Vec<SecurityRecord> = records.iter().map(|record| (*record).clone()).collect();
        self.write_rows(&krxfeed_lib::record_rows(&owned))
    }
}

/// Writes rows as space-padded columns.
fn write_table(rows: &RowSet, writer: &mut dyn Write) -> Result<()> {
    let columns = rows.columns();
    if columns.is_empty() {
        return Ok(());
    }

    let cells: Vec<Vec<String>> = rows
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(value_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|line| line[index].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let header: Vec<String> = columns.iter().map(|column| column.to_uppercase()).collect();
    write_padded(writer, &header, &widths)?;
    writeln!(writer, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len()))?;
    for line in &cells {
        write_padded(writer, line, &widths)?;
    }
    Ok(())
}

fn write_padded(writer: &mut dyn Write, fields: &[String], widths: &[usize]) -> Result<()> {
    let line: Vec<String> = fields
        .iter()
        .zip(widths)
        .map(|(field, width)| format!("{field:<width$}"))
        .collect();
    writeln!(writer, "{}", line.join("  ").trim_end())?;
    Ok(())
}

/// Parses a date argument, defaulting to today.
pub(crate) fn date_or_today(text: Option<&str>) -> Result<chrono::NaiveDate> {
    match text {
        Some(text) => parse_date(text).with_context(|| format!("Invalid date: {text}")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let records = [
            SecurityRecord::new("005930", "KR7005930003", "Samsung", Market::Kospi, None),
            SecurityRecord::new("035720", "KR7035720002", "Kakao", Market::Kospi, None),
        ];
        let rows = krxfeed_lib::record_rows(&records);

        let mut output = Vec::new();
        write_table(&rows, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert!(lines[0].starts_with("TICKER  ISIN"));
        assert!(lines[2].starts_with("005930  KR7005930003  Samsung  KOSPI"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(Format::Table.output_format(), None);
        assert_eq!(Format::Tsv.output_format(), Some(OutputFormat::Tsv));
    }

    #[test]
    fn test_date_argument() {
        assert_eq!(
            date_or_today(Some("2021-01-04")).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
        );
        assert!(date_or_today(Some("yesterday")).is_err());
    }
}
