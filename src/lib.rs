//! # optistats
//!
//! Sales statistics for an optical retail chain: date-range selection, filter
//! state, period bucketing, top-N rankings and product-type breakdowns, shaped
//! into view models for a dashboard or the terminal.
//!
//! ## Key Components
//! - [`date_range::DateRange`] - Validated, optionally open date window
//! - [`filters::FilterStore`] - Observable filter mapping with query projection
//! - [`bucketer::PeriodBucketer`] - Zero-filled day/week/month series
//! - [`ranking::rank`] - Top-N with shares of the full total
//! - [`taxonomy::merge`] - Sparse categories reconciled with the known taxonomy
//! - [`assembler::ViewModelAssembler`] - Display-ready views

pub mod assembler;
pub mod bucketer;
pub mod cli;
pub mod commands;
pub mod config;
pub mod date_range;
pub mod error;
pub mod filters;
pub mod formatting;
pub mod ranking;
pub mod records;
pub mod table_display;
pub mod taxonomy;

pub use assembler::{DashboardRequest, DashboardView, ViewModelAssembler};
pub use bucketer::{Granularity, PeriodBucketer, TrendPoint};
pub use date_range::DateRange;
pub use error::DateRangeError;
pub use filters::{FilterState, FilterStore, FilterValue, Filterable};
pub use ranking::{CategoryEntry, DisplayCount, Metric};
pub use taxonomy::Taxonomy;
