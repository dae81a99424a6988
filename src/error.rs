//! # Error Module
//!
//! Typed errors surfaced by the statistics core
//!
//! Everything except date parsing and range validation is total over well-typed input.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("Start date {start} is after end date {end}")]
    InvalidOrder { start: NaiveDate, end: NaiveDate },

    #[error("Date must be in YYYY-MM-DD or YYYYMMDD format, got: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, DateRangeError>;
