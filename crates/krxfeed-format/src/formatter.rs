//! Output format abstraction.

use krxfeed_types::{Row, RowSet, SecurityRecord};
use serde_json::Value;
use std::io::Write;
use thiserror::Error;

use crate::{CsvFormatter, JsonFormatter};

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// Tab-separated values.
    Tsv,
    /// JSON array.
    Json,
    /// Newline-delimited JSON.
    Ndjson,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Tsv, Self::Json, Self::Ndjson]
    }

    /// Writes a row-set with this format's default formatter.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_rows<W: Write>(&self, rows: &RowSet, writer: W) -> Result<(), FormatError> {
        match self {
            Self::Csv => CsvFormatter::new().write_rows(rows, writer),
            Self::Tsv => CsvFormatter::tsv().write_rows(rows, writer),
            Self::Json => JsonFormatter::new().write_rows(rows, writer),
            Self::Ndjson => JsonFormatter::ndjson().write_rows(rows, writer),
        }
    }

    /// Writes security records with this format's default formatter.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_records<W: Write>(
        &self,
        records: &[SecurityRecord],
        writer: W,
    ) -> Result<(), FormatError> {
        self.write_rows(&record_rows(records), writer)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for output formatters.
pub trait Formatter {
    /// Writes the rows of one block, columns in first-row order.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_rows<W: Write>(&self, rows: &RowSet, writer: W) -> Result<(), FormatError>;

    /// Writes security records as rows of `ticker`, `isin`, `name`, `market`, `delist_date`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_records<W: Write>(
        &self,
        records: &[SecurityRecord],
        writer: W,
    ) -> Result<(), FormatError> {
        self.write_rows(&record_rows(records), writer)
    }

    /// Returns the file extension for this format.
    fn extension(&self) -> &str;
}

/// Converts security records into a row-set named `records`.
#[must_use]
pub fn record_rows(records: &[SecurityRecord]) -> RowSet {
    let rows = records
        .iter()
        .map(|record| {
            let mut row = Row::new();
            row.insert("ticker".to_string(), Value::from(record.ticker()));
            row.insert("isin".to_string(), Value::from(record.isin()));
            row.insert("name".to_string(), Value::from(record.name()));
            row.insert("market".to_string(), Value::from(record.market().as_str()));
            row.insert(
                "delist_date".to_string(),
                record
                    .delist_date()
                    .map_or(Value::Null, |date| Value::from(date.to_string())),
            );
            row
        })
        .collect();
    RowSet::new("records", rows)
}
