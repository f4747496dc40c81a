//! Info command implementation.
//!
//! This module displays the resolved identifiers of a single ticker.

use anyhow::{Context, Result};
use krxfeed_lib::prelude::*;

/// Show the record a ticker resolves to.
pub(crate) fn show_info(krx: &Krx, ticker: &str) -> Result<()> {
    let record = krx
        .registry()
        .record(ticker)
        .with_context(|| format!("Failed to resolve ticker {ticker}"))?;

    println!("Ticker:  {}", record.ticker());
    println!("ISIN:    {}", record.isin());
    println!("Name:    {}", record.name());
    println!("Market:  {}", record.market());
    match record.delist_date() {
        Some(date) => println!("Status:  delisted on {}", date.format("%Y-%m-%d")),
        None => println!("Status:  listed"),
    }

    Ok(())
}
