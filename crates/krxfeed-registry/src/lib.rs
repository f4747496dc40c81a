//! Ticker registry for the krxfeed KRX data scraper.
//!
//! This crate resolves ticker, ISIN, name and market of every security ever
//! listed on the three equity boards.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use krxfeed_fetch::RequestClient;
//! use krxfeed_registry::TickerRegistry;
//!
//! let client = Arc::new(RequestClient::with_defaults()?);
//! let registry = TickerRegistry::new(client);
//!
//! // The first lookup fetches both finder routines
//! println!("{}", registry.isin_of("005930")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/krxfeed/krxfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod snapshot;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use chrono::NaiveDate;
use krxfeed_fetch::RequestClient;
use krxfeed_types::{DateRange, KrxError, Market, Result, SecurityRecord};

use crate::snapshot::Snapshot;

/// Registry of listed and delisted securities.
///
/// The snapshot is built on first use. Concurrent first callers wait on one
/// initializer, so the two finder routines are fetched exactly once. A failed
/// build is not kept; the next lookup tries again.
#[derive(Debug)]
pub struct TickerRegistry {
    client: Arc<RequestClient>,
    snapshot: OnceLock<Snapshot>,
    init: Mutex<()>,
}

impl TickerRegistry {
    /// Creates an empty registry that loads through `client` on first lookup.
    #[must_use]
    pub const fn new(client: Arc<RequestClient>) -> Self {
        Self {
            client,
            snapshot: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Returns true once the snapshot has been built.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.snapshot.get().is_some()
    }

    fn snapshot(&self) -> Result<&Snapshot> {
        if let Some(snapshot) = self.snapshot.get() {
            return Ok(snapshot);
        }
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = self.snapshot.get() {
            return Ok(snapshot);
        }
        let snapshot = Snapshot::fetch(&self.client)?;
        Ok(self.snapshot.get_or_init(|| snapshot))
    }

    /// Returns the record a ticker resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::UnknownTicker`] if the ticker was never listed, or
    /// the error that prevented the snapshot from loading.
    pub fn record(&self, ticker: &str) -> Result<&SecurityRecord> {
        self.snapshot()?.record(ticker)
    }

    /// Returns the ISIN of a ticker.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`].
    pub fn isin_of(&self, ticker: &str) -> Result<&str> {
        self.record(ticker).map(SecurityRecord::isin)
    }

    /// Returns the name of a ticker.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`].
    pub fn name_of(&self, ticker: &str) -> Result<&str> {
        self.record(ticker).map(SecurityRecord::name)
    }

    /// Returns the market of a ticker.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`].
    pub fn market_of(&self, ticker: &str) -> Result<Market> {
        self.record(ticker).map(SecurityRecord::market)
    }

    /// Returns the ticker of an ISIN (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::UnknownTicker`] naming the ISIN if it is unknown.
    pub fn ticker_of_isin(&self, isin: &str) -> Result<&str> {
        self.snapshot()?
            .by_isin(isin)
            .map(SecurityRecord::ticker)
            .ok_or_else(|| KrxError::UnknownTicker(isin.to_string()))
    }

    /// Returns the records alive on `date`, optionally restricted to one market.
    ///
    /// A security is alive if it has no delisting date or was delisted
    /// strictly after `date`. A reused ticker yields one record per ISIN.
    /// Results are sorted by ticker, then ISIN.
    ///
    /// # Errors
    ///
    /// Returns the error that prevented the snapshot from loading.
    pub fn alive_as_of(
        &self,
        date: NaiveDate,
        market: Option<Market>,
    ) -> Result<Vec<&SecurityRecord>> {
        Ok(sorted(
            self.snapshot()?
                .records()
                .iter()
                .filter(|record| market.is_none_or(|market| record.market() == market))
                .filter(|record| record.is_alive_on(date))
                .collect(),
        ))
    }

    /// Returns the tickers alive on `date`, optionally restricted to one market.
    ///
    /// # Errors
    ///
    /// Same as [`Self::alive_as_of`].
    pub fn tickers_as_of(
        &self,
        date: NaiveDate,
        market: Option<Market>,
    ) -> Result<BTreeSet<String>> {
        Ok(tickers(self.alive_as_of(date, market)?))
    }

    /// Returns the records delisted between `from` and `to`, both inclusive.
    ///
    /// Results are sorted by ticker, then ISIN.
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::DateRange`] if `from` is after `to`, or the error
    /// that prevented the snapshot from loading.
    pub fn delisted_records_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<&SecurityRecord>> {
        let range = DateRange::new(from, to)?;
        Ok(sorted(
            self.snapshot()?
                .records()
                .iter()
                .filter(|record| record.delist_date().is_some_and(|date| range.contains(date)))
                .collect(),
        ))
    }

    /// Returns the tickers delisted between `from` and `to`, both inclusive.
    ///
    /// # Errors
    ///
    /// Same as [`Self::delisted_records_between`].
    pub fn delisted_between(&self, from: NaiveDate, to: NaiveDate) -> Result<BTreeSet<String>> {
        Ok(tickers(self.delisted_records_between(from, to)?))
    }

    /// Searches resolved records by ticker or name (case-insensitive substring).
    ///
    /// Results are sorted by ticker.
    ///
    /// # Errors
    ///
    /// Returns the error that prevented the snapshot from loading.
    pub fn search(&self, pattern: &str) -> Result<Vec<&SecurityRecord>> {
        let pattern = pattern.trim().to_lowercase();
        let mut found: Vec<&SecurityRecord> = self
            .snapshot()?
            .resolved()
            .filter(|record| {
                record.ticker().to_lowercase().contains(&pattern)
                    || record.name().to_lowercase().contains(&pattern)
            })
            .collect();
        found.sort_by(|a, b| a.ticker().cmp(b.ticker()));
        Ok(found)
    }

    /// Returns the number of distinct tickers.
    ///
    /// # Errors
    ///
    /// Returns the error that prevented the snapshot from loading.
    pub fn len(&self) -> Result<usize> {
        Ok(self.snapshot()?.ticker_count())
    }

    /// Returns true if no ticker is known.
    ///
    /// # Errors
    ///
    /// Returns the error that prevented the snapshot from loading.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn sorted(mut records: Vec<&SecurityRecord>) -> Vec<&SecurityRecord> {
    records.sort_by(|a, b| (a.ticker(), a.isin()).cmp(&(b.ticker(), b.isin())));
    records
}

fn tickers(records: Vec<&SecurityRecord>) -> BTreeSet<String> {
    records
        .into_iter()
        .map(|record| record.ticker().to_string())
        .collect()
}
