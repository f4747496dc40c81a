//! Error types for krxfeed.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for krxfeed operations.
pub type Result<T> = std::result::Result<T, KrxError>;

/// Errors that can occur while talking to the exchange and resolving identifiers.
#[derive(Error, Debug)]
pub enum KrxError {
    /// Connection failure, timeout or retryable server status, after every attempt was spent.
    #[error("Transient network error after {attempts} attempts: {reason}")]
    TransientNetwork {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        reason: String,
    },

    /// Server answered with a status that is not worth retrying.
    #[error("Request rejected with HTTP status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// Payload could not be decoded or did not have the expected shape.
    #[error("Upstream format error: {0}")]
    UpstreamFormat(String),

    /// Well-formed payload whose block holds zero rows.
    #[error("No rows in block '{block}'")]
    EmptyResult {
        /// Name of the empty block.
        block: String,
    },

    /// Ticker not present in the registry.
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Market name or wire code not recognized.
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    /// Probe window produced no trading day.
    #[error(
        "No business day found within {window_days} days {} {date}",
        window_direction(.prev)
    )]
    NoBusinessDayFound {
        /// The requested anchor date.
        date: NaiveDate,
        /// Probe window size in calendar days.
        window_days: u32,
        /// Whether the window extended backward.
        prev: bool,
    },

    /// Date text that matches none of the accepted layouts.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Invalid date range.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),
}

impl KrxError {
    /// Returns true if the error means "no data for this query".
    ///
    /// Batch jobs treat these as empty tables instead of aborting. The format
    /// case is included because the exchange answers some holiday queries with
    /// a malformed envelope.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::EmptyResult { .. } | Self::UpstreamFormat(_))
    }
}

const fn window_direction(prev: &bool) -> &'static str {
    if *prev { "up to" } else { "from" }
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },

    /// Window of zero days requested.
    #[error("Date window must span at least one day")]
    EmptyWindow,

    /// Window reaching past the representable calendar.
    #[error("A {days}-day window at {anchor} leaves the supported calendar")]
    OutOfCalendar {
        /// The window anchor.
        anchor: NaiveDate,
        /// Requested window size.
        days: u32,
    },
}
