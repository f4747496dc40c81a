//! krxfeed CLI - Korea Exchange market data scraper.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use krxfeed_lib::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use display::{Destination, Format};

#[derive(Parser)]
#[command(name = "krxfeed")]
#[command(about = "Korea Exchange market data scraper", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only, no summaries)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Timeout of each HTTP request, in seconds
    #[arg(long, default_value = "3", global = true)]
    timeout: u64,

    /// Maximum attempts per request
    #[arg(long, default_value = "5", global = true)]
    attempts: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the identifiers of a ticker
    Info {
        /// Six-digit ticker (e.g., 005930)
        ticker: String,
    },

    /// List tickers alive on a date
    Tickers {
        /// Reference date (YYYYMMDD or YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,

        /// Restrict to one market (kospi, kosdaq, konex)
        #[arg(short, long)]
        market: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,

        /// Output file path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List tickers delisted within a date range
    Delisted {
        /// First day of the range (inclusive)
        #[arg(long)]
        from: String,

        /// Last day of the range (inclusive)
        #[arg(long)]
        to: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,

        /// Output file path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search tickers by code or name
    Search {
        /// Case-insensitive substring of the ticker or name
        pattern: String,
    },

    /// Resolve the nearest business day
    BusinessDay {
        /// Anchor date. Defaults to today.
        date: Option<String>,

        /// Look forward instead of backward
        #[arg(long)]
        next: bool,

        /// Probe window in calendar days
        #[arg(long, default_value = "7")]
        window: u32,
    },

    /// Run one report routine and write its rows
    Fetch {
        /// Routine id (e.g., dbms/MDC/STAT/standard/MDCSTAT01501)
        bld: String,

        /// Response block holding the rows
        #[arg(short, long, default_value = "OutBlock_1")]
        block: String,

        /// Request parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Follow pages until every row is collected
        #[arg(long)]
        paged: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Output file path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parses a `key=value` request parameter.
fn parse_param(text: &str) -> Result<(String, String), String> {
    text.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{text}'"))
}

/// Installs the stderr log subscriber; `RUST_LOG` takes precedence over the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = ClientConfig {
        timeout: Duration::from_secs(cli.timeout),
        retry: RetryPolicy::new(cli.attempts, Duration::from_millis(300)),
        ..ClientConfig::default()
    };
    let resolver = match &command {
        Commands::BusinessDay { window, .. } => ResolverConfig {
            window_days: *window,
            ..ResolverConfig::default()
        },
        _ => ResolverConfig::default(),
    };
    let krx = Krx::new(config, resolver).context("Failed to create HTTP client")?;
    let quiet = cli.quiet;

    match command {
        Commands::Info { ticker } => commands::info::show_info(&krx, &ticker),
        Commands::Tickers {
            date,
            market,
            format,
            output,
        } => commands::tickers::list_tickers(
            &krx,
            date.as_deref(),
            market.as_deref(),
            &Destination::new(format, output),
            quiet,
        ),
        Commands::Delisted {
            from,
            to,
            format,
            output,
        } => commands::tickers::list_delisted(
            &krx,
            &from,
            &to,
            &Destination::new(format, output),
            quiet,
        ),
        Commands::Search { pattern } => commands::search::search(&krx, &pattern, quiet),
        Commands::BusinessDay { date, next, .. } => {
            commands::business_day::business_day(&krx, date.as_deref(), next)
        }
        Commands::Fetch {
            bld,
            block,
            params,
            paged,
            format,
            output,
        } => commands::fetch::fetch(
            &krx,
            &Descriptor::custom(bld, block),
            &params,
            paged,
            &Destination::new(format, output),
            quiet,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("trdDd=20210104").unwrap(),
            ("trdDd".to_string(), "20210104".to_string())
        );
        assert_eq!(
            parse_param("searchText=").unwrap(),
            ("searchText".to_string(), String::new())
        );
        assert!(parse_param("mktId").is_err());
        assert!(parse_param("=STK").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "krxfeed",
            "-vv",
            "fetch",
            "dbms/MDC/STAT/standard/MDCSTAT01501",
            "-p",
            "mktId=STK",
            "-p",
            "trdDd=20210104",
            "--paged",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Some(Commands::Fetch { ref params, paged: true, .. }) if params.len() == 2
        ));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
