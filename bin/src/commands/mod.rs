//! CLI command implementations.

pub(crate) mod business_day;
pub(crate) mod fetch;
pub(crate) mod info;
pub(crate) mod search;
pub(crate) mod tickers;
