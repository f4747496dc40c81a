//! Merged directory snapshot.

use std::collections::{BTreeMap, HashMap};

use krxfeed_fetch::block::{DELISTED_FINDER, LISTED_FINDER};
use krxfeed_fetch::{Descriptor, RequestClient};
use krxfeed_types::{KrxError, Market, Result, SecurityRecord, parse_date};
use serde::Deserialize;
use tracing::{debug, info};

/// Finder parameters selecting every board with no name filter.
const FINDER_PARAMS: &[(&str, &str)] = &[("mktsel", "ALL"), ("searchText", "")];

/// One row of either finder routine.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FinderRow {
    #[serde(rename = "full_code")]
    isin: String,
    #[serde(rename = "short_code")]
    ticker: String,
    #[serde(rename = "codeName")]
    name: String,
    #[serde(rename = "marketCode")]
    market: String,
    #[serde(default, alias = "DELIST_DD")]
    delist_dd: Option<String>,
}

impl FinderRow {
    /// Converts the row, or `None` for boards outside the three equity markets.
    fn into_record(self) -> Result<Option<SecurityRecord>> {
        let Some(market) = Market::from_wire_code(self.market.trim()) else {
            debug!(ticker = %self.ticker, market = %self.market, "skipping board");
            return Ok(None);
        };
        let delist_date = match self.delist_dd.as_deref().map(str::trim) {
            None | Some("" | "-") => None,
            Some(text) => Some(parse_date(text).map_err(|_| {
                KrxError::UpstreamFormat(format!(
                    "delisting date '{text}' of {} is not a date",
                    self.isin
                ))
            })?),
        };
        Ok(Some(SecurityRecord::new(
            self.ticker.trim(),
            self.isin.trim(),
            self.name.trim(),
            market,
            delist_date,
        )))
    }
}

/// Directory a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Listed,
    Delisted,
}

/// Fetches one finder, an empty block reading as an empty directory.
fn directory(client: &RequestClient, descriptor: &Descriptor) -> Result<Vec<FinderRow>> {
    match client.fetch_typed(descriptor, FINDER_PARAMS) {
        Err(KrxError::EmptyResult { .. }) => {
            debug!(bld = descriptor.bld(), "finder returned no rows");
            Ok(Vec::new())
        }
        result => result,
    }
}

/// The merged, ticker-indexed table.
#[derive(Debug)]
pub(crate) struct Snapshot {
    /// Every security, one per ISIN, in ISIN order.
    records: Vec<SecurityRecord>,
    /// Ticker to position in `records` of the record it resolves to.
    by_ticker: HashMap<String, usize>,
    /// ISIN to position in `records`.
    by_isin: HashMap<String, usize>,
}

impl Snapshot {
    /// Fetches both finders and merges them.
    ///
    /// Either directory may be empty, but not both.
    pub(crate) fn fetch(client: &RequestClient) -> Result<Self> {
        let listed = directory(client, &LISTED_FINDER)?;
        let delisted = directory(client, &DELISTED_FINDER)?;
        if listed.is_empty() && delisted.is_empty() {
            return Err(KrxError::EmptyResult {
                block: LISTED_FINDER.output().to_string(),
            });
        }
        let snapshot = Self::merge(listed, delisted)?;
        info!(
            securities = snapshot.records.len(),
            tickers = snapshot.by_ticker.len(),
            "ticker registry built"
        );
        Ok(snapshot)
    }

    /// Merges both directories by ISIN, the listed row winning.
    pub(crate) fn merge(listed: Vec<FinderRow>, delisted: Vec<FinderRow>) -> Result<Self> {
        let mut merged: BTreeMap<String, (SecurityRecord, Source)> = BTreeMap::new();
        for (rows, source) in [(listed, Source::Listed), (delisted, Source::Delisted)] {
            for row in rows {
                if let Some(record) = row.into_record()? {
                    merged
                        .entry(record.isin().to_string())
                        .or_insert((record, source));
                }
            }
        }

        let mut records = Vec::with_capacity(merged.len());
        let mut sources = Vec::with_capacity(merged.len());
        for (record, source) in merged.into_values() {
            records.push(record);
            sources.push(source);
        }

        // Records are in ISIN order, so the first hit per directory is the lowest ISIN
        let mut by_ticker: HashMap<String, usize> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            let slot = by_ticker.entry(record.ticker().to_string()).or_insert(position);
            if sources[*slot] == Source::Delisted && sources[position] == Source::Listed {
                *slot = position;
            }
        }

        let by_isin = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.isin().to_string(), position))
            .collect();

        Ok(Self {
            records,
            by_ticker,
            by_isin,
        })
    }

    pub(crate) fn record(&self, ticker: &str) -> Result<&SecurityRecord> {
        self.by_ticker
            .get(ticker.trim())
            .map(|&position| &self.records[position])
            .ok_or_else(|| KrxError::UnknownTicker(ticker.to_string()))
    }

    pub(crate) fn by_isin(&self, isin: &str) -> Option<&SecurityRecord> {
        let isin = isin.trim().to_ascii_uppercase();
        self.by_isin.get(&isin).map(|&position| &self.records[position])
    }

    /// Every security, one per ISIN.
    pub(crate) fn records(&self) -> &[SecurityRecord] {
        &self.records
    }

    /// The record each ticker resolves to.
    pub(crate) fn resolved(&self) -> impl Iterator<Item = &SecurityRecord> {
        self.by_ticker.values().map(|&position| &self.records[position])
    }

    pub(crate) fn ticker_count(&self) -> usize {
        self.by_ticker.len()
    }
}
