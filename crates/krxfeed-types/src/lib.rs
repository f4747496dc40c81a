//! Core types for the krxfeed KRX data scraper.
//!
//! This crate provides the fundamental data structures used throughout krxfeed:
//!
//! - [`Market`] - Exchange board a security trades on (KOSPI, KOSDAQ, KONEX)
//! - [`SecurityRecord`] - Ticker, ISIN, name, market and delisting date of one security
//! - [`DateRange`] - Inclusive date range for probe windows and range filters
//! - [`RowSet`] - Ordered rows of one named block of an exchange response
//! - [`KrxError`] - Error taxonomy shared by every krxfeed crate

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/krxfeed/krxfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod date;
mod date_range;
mod error;
mod market;
mod row;
mod security;

pub use date::{format_date, parse_date};
pub use date_range::DateRange;
pub use error::{DateRangeError, KrxError, Result};
pub use market::{Market, MarketParseError};
pub use row::{Row, RowSet, value_text};
pub use security::SecurityRecord;
