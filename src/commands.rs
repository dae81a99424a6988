//! # Commands Module
//!
//! Command handlers for trend, ranking, category, overview and dashboard reports
//!
//! ## Key Components
//! - [`handle_trend_command`] - Period-bucketed sales series
//! - [`handle_rank_command`] - Top-N ranking by a record dimension
//! - [`handle_categories_command`] - Product-type cards over the full taxonomy
//! - [`handle_overview_command`] - Headline totals
//! - [`handle_dashboard_command`] - Every view for one selection

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use crate::assembler::{DashboardRequest, ViewModelAssembler};
use crate::bucketer::Granularity;
use crate::cli::QueryArgs;
use crate::config::Config;
use crate::date_range::DateRange;
use crate::filters::{FilterState, FilterStore, FilterValue};
use crate::ranking::{DisplayCount, Metric};
use crate::records::{Dimension, Sale, load_sales};
use crate::table_display::{format_category_cards, format_overview, format_ranking_table, format_trend_table};

/// Loaded and narrowed data shared by every report.
struct Selection {
    assembler: ViewModelAssembler,
    range: DateRange,
    filters: FilterState,
    sales: Vec<Sale>,
}

/// Collect `--filter` arguments through a store so the resulting state is
/// exactly what an interactive session would hold.
pub fn build_filters(pairs: &[(String, FilterValue)]) -> FilterStore {
    let mut store = FilterStore::with_callback(FilterState::new(), |state| {
        debug!("Filters changed: {} keys", state.len());
    });
    store.set_many(pairs.iter().cloned());
    store
}

fn prepare(config: &Config, query: &QueryArgs) -> Result<Selection> {
    let range = DateRange::parse(query.from.as_deref(), query.to.as_deref())
        .context("Invalid date range")?;

    let store = build_filters(&query.filters);
    if store.has_active() {
        debug!("Active filters: {}", store.to_query_string());
    }

    let assembler = config.assembler()?;
    let loaded = load_sales(&query.input, config.tz()?)?;
    if loaded.skipped > 0 {
        debug!("Skipped {} malformed records in {}", loaded.skipped, query.input.display());
    }

    let filters = store.filters().clone();
    let sales = assembler.select(&loaded.sales, &range, &filters);
    debug!("Selected {} of {} sales", sales.len(), loaded.sales.len());

    Ok(Selection {
        assembler,
        range,
        filters,
        sales,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

/// Handle the sales trend command
pub fn handle_trend_command(config: &Config, query: &QueryArgs, granularity: Option<Granularity>) -> Result<()> {
    let selection = prepare(config, query)?;
    let granularity = granularity.unwrap_or(config.default_granularity);

    let view = selection
        .assembler
        .trend_chart(&selection.sales, granularity, &selection.range);

    if query.json {
        print_json(&view)
    } else {
        print!("{}", format_trend_table(&view));
        Ok(())
    }
}

/// Handle the top-N ranking command
pub fn handle_rank_command(
    config: &Config,
    query: &QueryArgs,
    dimension: Dimension,
    metric: Metric,
    top: Option<DisplayCount>,
) -> Result<()> {
    let selection = prepare(config, query)?;
    let display_count = top.unwrap_or(config.default_display_count);

    let view = selection
        .assembler
        .ranking(&selection.sales, dimension, metric, display_count);

    if query.json {
        print_json(&view)
    } else {
        print!("{}", format_ranking_table(&view));
        Ok(())
    }
}

/// Handle the product-type breakdown command
pub fn handle_categories_command(config: &Config, query: &QueryArgs) -> Result<()> {
    let selection = prepare(config, query)?;
    let view = selection.assembler.product_type_cards(&selection.sales);

    if query.json {
        print_json(&view)
    } else {
        print!("{}", format_category_cards(&view));
        Ok(())
    }
}

pub fn handle_overview_command(config: &Config, query: &QueryArgs) -> Result<()> {
    let selection = prepare(config, query)?;
    let overview = selection.assembler.overview(&selection.sales);

    if query.json {
        print_json(&overview)
    } else {
        print!("{}", format_overview(&overview));
        Ok(())
    }
}

/// Handle the combined dashboard command
pub fn handle_dashboard_command(
    config: &Config,
    query: &QueryArgs,
    granularity: Option<Granularity>,
    metric: Metric,
    top: Option<DisplayCount>,
) -> Result<()> {
    let selection = prepare(config, query)?;
    let request = DashboardRequest {
        range: selection.range,
        granularity: granularity.unwrap_or(config.default_granularity),
        display_count: top.unwrap_or(config.default_display_count),
        metric,
        filters: selection.filters,
    };

    // Sales are already narrowed; selecting again is a no-op.
    let view = selection.assembler.dashboard(&selection.sales, &request);

    if query.json {
        print_json(&view)
    } else {
        print!("{}", format_overview(&view.overview));
        print!("{}", format_trend_table(&view.trend));
        print!("{}", format_ranking_table(&view.by_brand));
        print!("{}", format_ranking_table(&view.by_store));
        print!("{}", format_category_cards(&view.by_product_type));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_sales() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"1","timestamp":"2024-03-01T10:00:00Z","amount":120.0,"units":1,"brand":"Ray-Ban","store":"Centro","productType":"SUNGLASSES"}}"#).unwrap();
        writeln!(file, r#"{{"id":"2","timestamp":"2024-03-02T11:00:00Z","amount":80.0,"units":2,"brand":"Oakley","store":"Norte","productType":"FRAMES"}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        file
    }

    fn query(path: PathBuf, filters: Vec<(String, FilterValue)>) -> QueryArgs {
        QueryArgs {
            input: path,
            from: Some("2024-03-01".to_string()),
            to: Some("2024-03-31".to_string()),
            filters,
            json: true,
        }
    }

    #[test]
    fn test_build_filters_keeps_argument_order() {
        let store = build_filters(&[
            ("store".to_string(), FilterValue::from("Centro")),
            ("brand".to_string(), FilterValue::Null),
        ]);
        assert_eq!(store.filters().keys().collect::<Vec<_>>(), vec!["store", "brand"]);
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.to_query_string(), "store=Centro");
    }

    #[test]
    fn test_prepare_applies_range_and_filters() {
        let file = write_sales();
        let selection = prepare(
            &Config::default(),
            &query(file.path().to_path_buf(), vec![("brand".to_string(), FilterValue::from("oakley"))]),
        )
        .unwrap();

        assert_eq!(selection.sales.len(), 1);
        assert_eq!(selection.sales[0].id.as_deref(), Some("2"));
        assert!(selection.range.is_complete());
    }

    #[test]
    fn test_prepare_rejects_inverted_range() {
        let file = write_sales();
        let mut args = query(file.path().to_path_buf(), Vec::new());
        args.from = Some("2024-04-01".to_string());
        assert!(prepare(&Config::default(), &args).is_err());
    }

    #[test]
    fn test_handlers_run_on_sample_file() {
        let file = write_sales();
        let config = Config::default();
        let args = query(file.path().to_path_buf(), Vec::new());

        assert!(handle_trend_command(&config, &args, Some(Granularity::Week)).is_ok());
        assert!(handle_rank_command(&config, &args, Dimension::Store, Metric::Units, None).is_ok());
        assert!(handle_categories_command(&config, &args).is_ok());
        assert!(handle_overview_command(&config, &args).is_ok());
        assert!(handle_dashboard_command(&config, &args, None, Metric::Amount, Some(DisplayCount::Top5)).is_ok());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let args = query(PathBuf::from("/no/such/sales.jsonl"), Vec::new());
        assert!(handle_overview_command(&Config::default(), &args).is_err());
    }
}
