//! Rust library for scraping market data from the Korea Exchange data portal.
//!
//! This is a facade crate that re-exports functionality from the krxfeed
//! workspace crates and ties them together in the [`Krx`] context.
//!
//! # Quick Start
//!
//! ```no_run
//! use krxfeed_lib::prelude::*;
//!
//! let krx = Krx::global()?;
//! let date = parse_date("20210104")?;
//!
//! for ticker in krx.registry().tickers_as_of(date, Some(Market::Kosdaq))? {
//!     println!("{ticker} {}", krx.registry().name_of(&ticker)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/krxfeed/krxfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;

pub use context::Krx;

// Re-export core types
pub use krxfeed_types::*;

// Re-export the request pipeline
pub use krxfeed_fetch::{
    ClientConfig, Descriptor, HttpTransport, RawPayload, RequestClient, ResponseKind, RetryPolicy,
    Transport, TransportError, block, extract, extract_typed,
};

#[cfg(feature = "mock")]
pub use krxfeed_fetch::mock;

// Re-export identifier resolution
pub use krxfeed_calendar::{BusinessDayResolver, ResolverConfig};
pub use krxfeed_registry::TickerRegistry;

// Re-export formatters
#[cfg(feature = "format")]
pub use krxfeed_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat, record_rows,
};

/// Prelude module for convenient imports.
///
/// ```
/// use krxfeed_lib::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Krx;

    pub use krxfeed_types::{
        DateRange, KrxError, Market, Result, RowSet, SecurityRecord, format_date, parse_date,
    };

    pub use krxfeed_fetch::{ClientConfig, Descriptor, RequestClient, RetryPolicy};

    pub use krxfeed_calendar::{BusinessDayResolver, ResolverConfig};
    pub use krxfeed_registry::TickerRegistry;

    #[cfg(feature = "format")]
    pub use krxfeed_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
