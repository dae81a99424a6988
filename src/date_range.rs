//! # Date Range Module
//!
//! Validation and normalization of the query window used by every statistics view
//!
//! ## Key Components
//! - [`DateRange`] - Start/end pair where either side may still be unset
//! - [`parse_date`] - Parse `YYYY-MM-DD` or compact `YYYYMMDD` input
//! - [`format_date`] - Canonical `YYYY-MM-DD` rendering for display and the wire

use chrono::{Datelike, Days, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{DateRangeError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();
    static ref COMPACT_DATE: Regex = Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap();
}

/// Query window for the statistics views. Both ends are inclusive.
///
/// A range with a missing end is valid ("not selected yet") but not
/// complete; views that need a window must not query with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, rejecting `start > end` when both are present.
    pub fn validate(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(DateRangeError::InvalidOrder { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from user input. Blank strings count as unset.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = parse_optional(start)?;
        let end = parse_optional(end)?;
        Self::validate(start, end)
    }

    pub fn unset() -> Self {
        Self::default()
    }

    /// The `n` calendar days ending on `today`, today included.
    pub fn last_days(today: NaiveDate, n: u32) -> Self {
        let span = u64::from(n.max(1)) - 1;
        Self {
            start: Some(today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN)),
            end: Some(today),
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let first = first_of_month(date);
        let last = first_of_next_month(first).pred_opt().unwrap_or(first);
        Self {
            start: Some(first),
            end: Some(last),
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Replace the start date; the range is left untouched on error.
    pub fn set_start(&mut self, start: Option<NaiveDate>) -> Result<()> {
        *self = Self::validate(start, self.end)?;
        Ok(())
    }

    /// Replace the end date; the range is left untouched on error.
    pub fn set_end(&mut self, end: Option<NaiveDate>) -> Result<()> {
        *self = Self::validate(self.start, end)?;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Both ends, only when the range is complete.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Inclusive membership test; an unset side is open.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let after_start = self.start.is_none_or(|start| date >= start);
        let before_end = self.end.is_none_or(|end| date <= end);
        after_start && before_end
    }

    /// Number of calendar days covered, when complete.
    pub fn num_days(&self) -> Option<i64> {
        self.bounds().map(|(start, end)| (end - start).num_days() + 1)
    }

    /// Wire representation of both ends (`None` for unset sides).
    pub fn to_wire(&self) -> (Option<String>, Option<String>) {
        (self.start.map(format_date), self.end.map(format_date))
    }
}

/// Canonical `YYYY-MM-DD` form used both for display and as the query value.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date in `YYYY-MM-DD` or `YYYYMMDD` format.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    let caps = ISO_DATE
        .captures(trimmed)
        .or_else(|| COMPACT_DATE.captures(trimmed))
        .ok_or_else(|| DateRangeError::InvalidFormat(date_str.to_string()))?;

    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    match (field(1), field(2), field(3)) {
        (Some(year), Some(month), Some(day)) => NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| DateRangeError::InvalidFormat(date_str.to_string())),
        _ => Err(DateRangeError::InvalidFormat(date_str.to_string())),
    }
}

fn parse_optional(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        Some(s) if !s.trim().is_empty() => parse_date(s).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub(crate) fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
