//! # Period Bucketer Module
//!
//! Shapes time-stamped values into a zero-filled trend series for a date range
//!
//! ## Key Components
//! - [`Granularity`] - Day, ISO week or calendar month buckets
//! - [`PeriodBucketer`] - Timezone-aware bucketing of records into [`TrendPoint`]s
//! - [`bucket_keys`] - The buckets a range must produce, independent of data

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::date_range::{DateRange, first_of_month, first_of_next_month, format_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// First calendar day of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            Granularity::Month => first_of_month(date),
        }
    }

    /// `None` past the last representable date.
    fn next_bucket(self, bucket_start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => bucket_start.checked_add_days(Days::new(1)),
            Granularity::Week => bucket_start.checked_add_days(Days::new(7)),
            Granularity::Month => Some(first_of_next_month(bucket_start)),
        }
    }

    /// Period key for a bucket: `YYYY-MM-DD` for days and weeks (the ISO
    /// week's Monday), `YYYY-MM` for months. Keys sort chronologically.
    pub fn label(self, bucket_start: NaiveDate) -> String {
        match self {
            Granularity::Day | Granularity::Week => format_date(bucket_start),
            Granularity::Month => bucket_start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedValue {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub period_key: String,
    pub total_value: f64,
    pub count: u64,
}

/// Bucket start dates covering `start..=end`, in ascending order.
fn bucket_starts(granularity: Granularity, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut starts = Vec::new();
    let mut current = granularity.bucket_start(start);
    while current <= end {
        starts.push(current);
        match granularity.next_bucket(current) {
            Some(next) if next > current => current = next,
            _ => break,
        }
    }
    starts
}

/// Every period key a complete range must produce. Empty for incomplete ranges.
pub fn bucket_keys(granularity: Granularity, range: &DateRange) -> Vec<String> {
    match range.bounds() {
        Some((start, end)) => bucket_starts(granularity, start, end)
            .into_iter()
            .map(|s| granularity.label(s))
            .collect(),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PeriodBucketer {
    timezone: Tz,
}

impl Default for PeriodBucketer {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

impl PeriodBucketer {
    /// Timestamps are converted to calendar dates in `timezone` before bucketing.
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn local_date(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&self.timezone).date_naive()
    }

    pub fn bucketize(&self, records: &[TimedValue], granularity: Granularity, range: &DateRange) -> Vec<TrendPoint> {
        self.bucketize_by(records, granularity, range, |r| Some(r.timestamp), |r| Some(r.value))
    }

    /// Bucket arbitrary records. Records whose timestamp or value is missing
    /// or non-finite, or whose date falls outside `range`, are skipped.
    ///
    /// An incomplete range yields an empty series ("no chart"); a complete
    /// range with no records yields the full zero-filled series.
    pub fn bucketize_by<T, F, V>(
        &self,
        records: &[T],
        granularity: Granularity,
        range: &DateRange,
        timestamp: F,
        value: V,
    ) -> Vec<TrendPoint>
    where
        F: Fn(&T) -> Option<DateTime<Utc>>,
        V: Fn(&T) -> Option<f64>,
    {
        let Some((start, end)) = range.bounds() else {
            return Vec::new();
        };

        let mut totals: HashMap<NaiveDate, (f64, u64)> = HashMap::new();
        let mut malformed = 0usize;
        let mut out_of_range = 0usize;

        for record in records {
            let (Some(ts), Some(amount)) = (timestamp(record), value(record)) else {
                malformed += 1;
                continue;
            };
            if !amount.is_finite() {
                malformed += 1;
                continue;
            }

            let date = self.local_date(ts);
            if !range.contains(date) {
                out_of_range += 1;
                continue;
            }

            let bucket = totals.entry(granularity.bucket_start(date)).or_insert((0.0, 0));
            bucket.0 += amount;
            bucket.1 += 1;
        }

        if malformed > 0 || out_of_range > 0 {
            debug!(
                "Bucketing skipped {} malformed and {} out-of-range records",
                malformed, out_of_range
            );
        }

        bucket_starts(granularity, start, end)
            .into_iter()
            .map(|bucket| {
                let (total_value, count) = totals.get(&bucket).copied().unwrap_or((0.0, 0));
                TrendPoint {
                    period_key: granularity.label(bucket),
                    total_value,
                    count,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse(Some(start), Some(end)).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn value(ts: DateTime<Utc>, value: f64) -> TimedValue {
        TimedValue { timestamp: ts, value }
    }

    #[test]
    fn test_day_buckets_cover_inclusive_range() {
        let points = PeriodBucketer::default().bucketize(&[], Granularity::Day, &range("2024-01-01", "2024-01-10"));
        assert_eq!(points.len(), 10);
        assert_eq!(points[0].period_key, "2024-01-01");
        assert_eq!(points[9].period_key, "2024-01-10");
    }

    #[test]
    fn test_empty_month_range_is_zero_filled() {
        let points = PeriodBucketer::default().bucketize(&[], Granularity::Month, &range("2024-01-01", "2024-03-01"));
        let keys: Vec<&str> = points.iter().map(|p| p.period_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
        assert!(points.iter().all(|p| p.total_value == 0.0 && p.count == 0));
    }

    #[test]
    fn test_incomplete_range_yields_no_series() {
        let open = DateRange::parse(Some("2024-01-01"), None).unwrap();
        let records = vec![value(at(2024, 1, 2, 10), 50.0)];
        assert!(PeriodBucketer::default().bucketize(&records, Granularity::Day, &open).is_empty());
        assert!(bucket_keys(Granularity::Week, &open).is_empty());
    }

    #[test]
    fn test_week_buckets_start_on_monday() {
        // 2024-01-03 is a Wednesday, 2024-01-09 the following Tuesday
        let keys = bucket_keys(Granularity::Week, &range("2024-01-03", "2024-01-09"));
        assert_eq!(keys, vec!["2024-01-01", "2024-01-08"]);

        let january = bucket_keys(Granularity::Week, &range("2024-01-01", "2024-01-31"));
        assert_eq!(january.len(), 5);
    }

    #[test]
    fn test_week_buckets_are_not_day_multiples() {
        // 2023-12-28 (Thu) .. 2024-01-02 (Tue) spans two ISO weeks across a year boundary
        let keys = bucket_keys(Granularity::Week, &range("2023-12-28", "2024-01-02"));
        assert_eq!(keys, vec!["2023-12-25", "2024-01-01"]);

        let months = bucket_keys(Granularity::Month, &range("2024-01-31", "2024-02-01"));
        assert_eq!(months, vec!["2024-01", "2024-02"]);
    }

    #[test]
    fn test_aggregation_conserves_in_range_values() {
        let records = vec![
            value(at(2024, 1, 1, 9), 100.0),
            value(at(2024, 1, 1, 18), 50.5),
            value(at(2024, 1, 3, 12), 20.0),
            value(at(2023, 12, 31, 12), 999.0),
            value(at(2024, 1, 5, 12), 999.0),
        ];
        let points = PeriodBucketer::default().bucketize(&records, Granularity::Day, &range("2024-01-01", "2024-01-04"));

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].total_value, 150.5);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].count, 0);
        assert_eq!(points[2].total_value, 20.0);

        let total: f64 = points.iter().map(|p| p.total_value).sum();
        assert_eq!(total, 170.5);
    }

    #[test]
    fn test_month_aggregation_over_uneven_months() {
        let records = vec![
            value(at(2024, 1, 31, 12), 10.0),
            value(at(2024, 2, 29, 12), 20.0),
            value(at(2024, 3, 1, 12), 30.0),
        ];
        let points = PeriodBucketer::default().bucketize(&records, Granularity::Month, &range("2024-01-15", "2024-03-10"));
        let totals: Vec<f64> = points.iter().map(|p| p.total_value).collect();
        assert_eq!(totals, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_timezone_moves_record_across_month_boundary() {
        let madrid: Tz = "Europe/Madrid".parse().unwrap();
        let records = vec![value(at(2024, 1, 31, 23), 42.0)];
        let window = range("2024-01-01", "2024-02-29");

        let utc_points = PeriodBucketer::default().bucketize(&records, Granularity::Month, &window);
        assert_eq!(utc_points[0].total_value, 42.0);

        let local_points = PeriodBucketer::new(madrid).bucketize(&records, Granularity::Month, &window);
        assert_eq!(local_points[0].total_value, 0.0);
        assert_eq!(local_points[1].total_value, 42.0);
    }

    #[test]
    fn test_week_aggregation_drops_partial_first_week() {
        // 2024-01-03 is a Wednesday; the 2nd falls in the first bucket but before the range
        let records = vec![
            value(at(2024, 1, 2, 12), 5.0),
            value(at(2024, 1, 7, 12), 7.0),
            value(at(2024, 1, 8, 12), 11.0),
        ];
        let points = PeriodBucketer::default().bucketize(&records, Granularity::Week, &range("2024-01-03", "2024-01-14"));

        assert_eq!(
            points,
            vec![
                TrendPoint { period_key: "2024-01-01".to_string(), total_value: 7.0, count: 1 },
                TrendPoint { period_key: "2024-01-08".to_string(), total_value: 11.0, count: 1 },
            ]
        );

        let total: f64 = points.iter().map(|p| p.total_value).sum();
        assert_eq!(total, 18.0);
    }

    #[test]
    fn test_bucketing_at_calendar_limits_does_not_overflow() {
        for granularity in [Granularity::Day, Granularity::Week, Granularity::Month] {
            let last = DateRange::validate(Some(NaiveDate::MAX), Some(NaiveDate::MAX)).unwrap();
            let points = PeriodBucketer::default().bucketize(&[], granularity, &last);
            assert_eq!(points.len(), 1);

            let first = DateRange::validate(Some(NaiveDate::MIN), Some(NaiveDate::MIN)).unwrap();
            let points = PeriodBucketer::default().bucketize(&[], granularity, &first);
            assert_eq!(points.len(), 1);
        }
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        struct Raw {
            ts: Option<DateTime<Utc>>,
            amount: Option<f64>,
        }
        let rows = vec![
            Raw { ts: Some(at(2024, 1, 1, 8)), amount: Some(10.0) },
            Raw { ts: None, amount: Some(99.0) },
            Raw { ts: Some(at(2024, 1, 1, 9)), amount: None },
            Raw { ts: Some(at(2024, 1, 1, 10)), amount: Some(f64::NAN) },
        ];
        let points = PeriodBucketer::default().bucketize_by(
            &rows,
            Granularity::Day,
            &range("2024-01-01", "2024-01-01"),
            |r| r.ts,
            |r| r.amount,
        );
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].total_value, 10.0);
        assert_eq!(points[0].count, 1);
    }
}
