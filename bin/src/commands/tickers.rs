//! Ticker listing commands.
//!
//! This module lists tickers alive on a date and tickers delisted within a range.

use anyhow::{Context, Result};
use krxfeed_lib::prelude::*;

use crate::display::{Destination, date_or_today};

/// List tickers alive on a date, optionally restricted to one market.
pub(crate) fn list_tickers(
    krx: &Krx,
    date: Option<&str>,
    market: Option<&str>,
    destination: &Destination,
    quiet: bool,
) -> Result<()> {
    let date = date_or_today(date)?;
    let market = market.map(str::parse::<Market>).transpose()?;

    let records = krx
        .registry()
        .alive_as_of(date, market)
        .context("Failed to load the ticker registry")?;
    destination.write_records(&records)?;

    if !quiet {
        eprintln!("Total: {} securities alive on {date}", records.len());
    }
    Ok(())
}

/// List tickers delisted between two dates, both inclusive.
pub(crate) fn list_delisted(
    krx: &Krx,
    from: &str,
    to: &str,
    destination: &Destination,
    quiet: bool,
) -> Result<()> {
    let from = parse_date(from).with_context(|| format!("Invalid start date: {from}"))?;
    let to = parse_date(to).with_context(|| format!("Invalid end date: {to}"))?;

    let records = krx
        .registry()
        .delisted_records_between(from, to)
        .context("Failed to list delisted tickers")?;
    destination.write_records(&records)?;

    if !quiet {
        eprintln!("Total: {} securities delisted from {from} to {to}", records.len());
    }
    Ok(())
}
