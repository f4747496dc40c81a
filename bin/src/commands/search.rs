//! Search command implementation.

use anyhow::{Context, Result};
use krxfeed_lib::prelude::*;

/// List tickers whose code or name contains the pattern.
pub(crate) fn search(krx: &Krx, pattern: &str, quiet: bool) -> Result<()> {
    let found = krx
        .registry()
        .search(pattern)
        .context("Failed to load the ticker registry")?;

    if found.is_empty() {
        println!("No tickers found.");
        return Ok(());
    }

    println!("{:<8} {:<14} {:<8} NAME", "TICKER", "ISIN", "MARKET");
    println!("{}", "-".repeat(50));

    for record in &found {
        println!(
            "{:<8} {:<14} {:<8} {}",
            record.ticker(),
            record.isin(),
            record.market(),
            record.name()
        );
    }

    if !quiet {
        println!("\nTotal: {} tickers", found.len());
    }
    Ok(())
}
