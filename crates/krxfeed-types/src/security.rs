//! Security identifier records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Market;

/// Identity of one listed or formerly listed security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRecord {
    /// Six-digit short code (e.g., "005930").
    ticker: String,
    /// Twelve-character ISIN (e.g., "KR7005930003").
    isin: String,
    /// Korean short name as published by the exchange.
    name: String,
    /// Board the security trades or traded on.
    market: Market,
    /// Date the security was removed from the board, if it was.
    delist_date: Option<NaiveDate>,
}

impl SecurityRecord {
    /// Creates a new record.
    #[must_use]
    pub fn new(
        ticker: impl Into<String>,
        isin: impl Into<String>,
        name: impl Into<String>,
        market: Market,
        delist_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            isin: isin.into(),
            name: name.into(),
            market,
            delist_date,
        }
    }

    /// Returns the six-digit ticker.
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Returns the ISIN.
    #[must_use]
    pub fn isin(&self) -> &str {
        &self.isin
    }

    /// Returns the security name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the market.
    #[must_use]
    pub const fn market(&self) -> Market {
        self.market
    }

    /// Returns the delisting date, if any.
    #[must_use]
    pub const fn delist_date(&self) -> Option<NaiveDate> {
        self.delist_date
    }

    /// Returns true if the security has no delisting date.
    #[must_use]
    pub const fn is_listed(&self) -> bool {
        self.delist_date.is_none()
    }

    /// Returns true if the security was still alive on `date`.
    ///
    /// A security delisted on `date` itself is not alive; one delisted on any
    /// later day is.
    #[must_use]
    pub fn is_alive_on(&self, date: NaiveDate) -> bool {
        self.delist_date.is_none_or(|delisted| delisted > date)
    }
}

impl std::fmt::Display for SecurityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.ticker, self.market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_creation() {
        let record = SecurityRecord::new("005930", "KR7005930003", "삼성전자", Market::Kospi, None);

        assert_eq!(record.ticker(), "005930");
        assert_eq!(record.isin(), "KR7005930003");
        assert_eq!(record.market(), Market::Kospi);
        assert!(record.is_listed());
        assert_eq!(record.to_string(), "삼성전자 (005930, KOSPI)");
    }

    #[test]
    fn test_alive_is_strictly_before_delisting() {
        let record = SecurityRecord::new(
            "107590",
            "KR7107590003",
            "미원에스씨",
            Market::Kospi,
            Some(ymd(2020, 1, 2)),
        );

        assert!(record.is_alive_on(ymd(2020, 1, 1)));
        assert!(!record.is_alive_on(ymd(2020, 1, 2)));
        assert!(!record.is_alive_on(ymd(2020, 1, 3)));
    }
}
