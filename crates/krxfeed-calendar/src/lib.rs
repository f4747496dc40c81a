//! Business day resolution for the krxfeed KRX data scraper.
//!
//! Trading days are not stored anywhere; a date is a trading day if the
//! reference index has a close for it.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/krxfeed/krxfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use krxfeed_fetch::RequestClient;
use krxfeed_fetch::block::INDEX_OHLCV;
use krxfeed_types::{DateRange, KrxError, Result, format_date, parse_date};
use tracing::{debug, info};

/// Row field holding the trading date of an index close.
const TRADE_DATE: &str = "TRD_DD";

/// Configuration for the business day resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Probe window size in calendar days, anchor included.
    pub window_days: u32,
    /// Index family of the reference index (`indIdx`).
    pub index_family: String,
    /// Index number within the family (`indIdx2`).
    pub index_number: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        // KOSPI composite, code 1001
        Self {
            window_days: 7,
            index_family: "1".to_string(),
            index_number: "001".to_string(),
        }
    }
}

/// Finds the trading day nearest to a date by probing the reference index.
#[derive(Debug, Clone)]
pub struct BusinessDayResolver {
    client: Arc<RequestClient>,
    config: ResolverConfig,
}

impl BusinessDayResolver {
    /// Creates a resolver with the default seven-day window.
    #[must_use]
    pub fn new(client: Arc<RequestClient>) -> Self {
        Self::with_config(client, ResolverConfig::default())
    }

    /// Creates a resolver with the given configuration.
    #[must_use]
    pub const fn with_config(client: Arc<RequestClient>, config: ResolverConfig) -> Self {
        Self { client, config }
    }

    /// Returns the resolver configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the trading days within `range`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::EmptyResult`] if the range holds no trading day,
    /// [`KrxError::UpstreamFormat`] if a row date cannot be parsed, or any
    /// error of the request.
    pub fn trading_days(&self, range: DateRange) -> Result<Vec<NaiveDate>> {
        let start = format_date(range.start);
        let end = format_date(range.end);
        let params = [
            ("indIdx", self.config.index_family.as_str()),
            ("indIdx2", self.config.index_number.as_str()),
            ("strtDd", start.as_str()),
            ("endDd", end.as_str()),
        ];
        let rows = self.client.fetch_rows(&INDEX_OHLCV, &params)?;

        let mut days = rows
            .column_text(TRADE_DATE)
            .map(|text| {
                parse_date(&text).map_err(|_| {
                    KrxError::UpstreamFormat(format!("'{text}' in {TRADE_DATE} is not a date"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        days.retain(|day| range.contains(*day));
        days.sort_unstable();
        days.dedup();
        debug!(%range, trading_days = days.len(), "probed reference index");
        Ok(days)
    }

    /// Returns the nearest trading day on or before (`prev`) or on or after `date`.
    ///
    /// The search covers [`ResolverConfig::window_days`] calendar days and is
    /// not widened when it comes back empty.
    ///
    /// # Errors
    ///
    /// Returns [`KrxError::NoBusinessDayFound`] if the window holds no trading
    /// day, or any error of the request.
    pub fn nearest(&self, date: NaiveDate, prev: bool) -> Result<NaiveDate> {
        let window_days = self.config.window_days;
        let not_found = || KrxError::NoBusinessDayFound {
            date,
            window_days,
            prev,
        };

        let window = DateRange::window(date, window_days, prev)?;
        let days = match self.trading_days(window) {
            Err(KrxError::EmptyResult { .. }) => return Err(not_found()),
            result => result?,
        };
        let found = if prev { days.last() } else { days.first() };
        let found = found.copied().ok_or_else(not_found)?;

        info!(%date, prev, business_day = %found, "resolved business day");
        Ok(found)
    }

    /// Runs a date-keyed query, retrying once on the prior trading day if it comes back empty.
    ///
    /// The result counts as empty if the query fails with
    /// [`KrxError::EmptyResult`] or `is_empty` holds for it. The query is not
    /// re-run when `date` is itself the nearest prior trading day.
    ///
    /// # Errors
    ///
    /// Returns the error of the last query run, or of the business day probe.
    pub fn retry_on_prior_day<T>(
        &self,
        date: NaiveDate,
        is_empty: impl Fn(&T) -> bool,
        mut query: impl FnMut(NaiveDate) -> Result<T>,
    ) -> Result<T> {
        let first = query(date);
        let empty = match &first {
            Ok(value) => is_empty(value),
            Err(KrxError::EmptyResult { .. }) => true,
            Err(_) => false,
        };
        if !empty {
            return first;
        }

        let prior = self.nearest(date, true)?;
        if prior == date {
            return first;
        }
        debug!(%date, %prior, "query empty, retrying on prior business day");
        query(prior)
    }
}
