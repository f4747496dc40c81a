//! Fetch command implementation.
//!
//! This module runs one report routine and writes the rows it returns.

use anyhow::{Context, Result};
use krxfeed_lib::prelude::*;
use tracing::warn;

use crate::display::Destination;

/// Run a report routine, optionally following every page.
pub(crate) fn fetch(
    krx: &Krx,
    descriptor: &Descriptor,
    params: &[(String, String)],
    paged: bool,
    destination: &Destination,
    quiet: bool,
) -> Result<()> {
    let params: Vec<(&str, &str)> = params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let fetched = if paged {
        krx.client().fetch_all_pages(descriptor, &params)
    } else {
        krx.client().fetch_rows(descriptor, &params)
    };
    let rows = RowSet::or_empty(fetched, descriptor.output())
        .with_context(|| format!("Failed to fetch {}", descriptor.bld()))?;

    if rows.is_empty() {
        warn!(bld = descriptor.bld(), "routine returned no rows");
    }
    destination.write_rows(&rows)?;

    if !quiet {
        eprintln!("Fetched {} rows from {}", rows.len(), descriptor.bld());
    }
    Ok(())
}
