//! Business day command implementation.

use anyhow::{Context, Result};
use krxfeed_lib::prelude::*;

use crate::display::date_or_today;

/// Print the trading day nearest to a date.
pub(crate) fn business_day(krx: &Krx, date: Option<&str>, next: bool) -> Result<()> {
    let date = date_or_today(date)?;
    let day = krx
        .resolver()
        .nearest(date, !next)
        .with_context(|| format!("Failed to resolve the business day near {date}"))?;

    println!("{}", format_date(day));
    Ok(())
}
