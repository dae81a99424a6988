//! # CLI Module
//!
//! Command-line interface definitions and argument parsing for optistats
//!
//! ## Key Components
//! - [`Args`] - Main CLI arguments structure
//! - [`Commands`] - Subcommand definitions
//! - [`QueryArgs`] - Input file, date window and filters shared by every report
//! - [`parse_filter`] - `key=value` filter argument parser

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::bucketer::Granularity;
use crate::filters::FilterValue;
use crate::ranking::{DisplayCount, Metric};
use crate::records::Dimension;

#[derive(Debug, Clone, ClapArgs)]
pub struct QueryArgs {
    /// Sales export to read (JSON array or JSONL)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start date, inclusive (YYYY-MM-DD or YYYYMMDD)
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive (YYYY-MM-DD or YYYYMMDD)
    #[arg(long)]
    pub to: Option<String>,

    /// Filter as key=value; repeat for more filters, comma-separate for any-of
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, FilterValue)>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sales trend bucketed by day, week or month
    Trend {
        #[command(flatten)]
        query: QueryArgs,

        /// Bucket size (defaults to the configured granularity)
        #[arg(long, value_enum)]
        granularity: Option<Granularity>,
    },
    /// Top-N ranking by brand, store or product type
    Rank {
        #[command(flatten)]
        query: QueryArgs,

        /// Field to group by
        #[arg(long, default_value = "brand", value_enum)]
        by: Dimension,

        /// Metric to rank by
        #[arg(long, default_value = "amount", value_enum)]
        metric: Metric,

        /// Rows to show: 5, 10, 20 or all (defaults to the configured count)
        #[arg(long)]
        top: Option<DisplayCount>,
    },
    /// Sales per product type, every known type included
    Categories {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Headline totals
    Overview {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Every view in one document
    Dashboard {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, value_enum)]
        granularity: Option<Granularity>,

        #[arg(long, default_value = "amount", value_enum)]
        metric: Metric,

        #[arg(long)]
        top: Option<DisplayCount>,
    },
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Optical retail statistics - trends, rankings and category breakdowns"
)]
pub struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Configuration file (can also use OPTISTATS_CONFIG_DIR env var)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Parse `key=value`. A value with commas becomes a list, `null` clears the key.
pub fn parse_filter(arg: &str) -> Result<(String, FilterValue), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("Filter must look like key=value, got: {}", arg))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Filter key is empty in: {}", arg));
    }

    let value = value.trim();
    let parsed = if value.eq_ignore_ascii_case("null") {
        FilterValue::Null
    } else if value.contains(',') {
        FilterValue::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        )
    } else {
        FilterValue::Text(value.to_string())
    };

    Ok((key.to_string(), parsed))
}
