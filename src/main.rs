//! # optistats
//!
//! Terminal front end for the sales statistics dashboard
//!
//! ## Key Components
//! - [`main`] - Parses arguments, sets up logging and configuration, dispatches

use anyhow::Result;
use clap::Parser;
use log::debug;

use optistats::cli::{Args, Commands};
use optistats::commands::{
    handle_categories_command, handle_dashboard_command, handle_overview_command, handle_rank_command,
    handle_trend_command,
};
use optistats::config::Config;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger based on debug flag
    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    }

    let config = Config::load(args.config.as_deref())?;
    debug!("Using timezone {}", config.timezone);

    match &args.command {
        Commands::Trend { query, granularity } => handle_trend_command(&config, query, *granularity),
        Commands::Rank {
            query,
            by,
            metric,
            top,
        } => handle_rank_command(&config, query, *by, *metric, *top),
        Commands::Categories { query } => handle_categories_command(&config, query),
        Commands::Overview { query } => handle_overview_command(&config, query),
        Commands::Dashboard {
            query,
            granularity,
            metric,
            top,
        } => handle_dashboard_command(&config, query, *granularity, *metric, *top),
    }
}
