//! # Category Ranking Module
//!
//! Top-N ranking with percentage-of-total for categorical breakdowns
//! (by brand, by store, by product type)
//!
//! ## Key Components
//! - [`CategoryEntry`] - One category with its primary/secondary metrics
//! - [`DisplayCount`] - Top-5/10/20/All display cutoff
//! - [`rank`] - Stable descending sort, population total, truncation and shares
//! - [`aggregate_by`] - Fold raw records into category entries

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub category_key: String,
    pub metric_primary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_secondary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl CategoryEntry {
    pub fn new(category_key: impl Into<String>, metric_primary: f64) -> Self {
        Self {
            category_key: category_key.into(),
            metric_primary,
            metric_secondary: None,
            rank: None,
        }
    }

    pub fn with_secondary(mut self, metric_secondary: f64) -> Self {
        self.metric_secondary = Some(metric_secondary);
        self
    }

    /// Zero-valued stand-in for a category with no data.
    pub fn placeholder(category_key: impl Into<String>) -> Self {
        Self::new(category_key, 0.0).with_secondary(0.0)
    }
}

/// Which metric a breakdown is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Sales amount (primary metric)
    #[default]
    Amount,
    /// Units sold (secondary metric)
    Units,
}

impl Metric {
    pub fn value(self, entry: &CategoryEntry) -> f64 {
        match self {
            Metric::Amount => entry.metric_primary,
            Metric::Units => entry.metric_secondary.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "DisplayCountInput")]
pub enum DisplayCount {
    #[serde(rename = "5")]
    Top5,
    #[default]
    #[serde(rename = "10")]
    Top10,
    #[serde(rename = "20")]
    Top20,
    #[serde(rename = "all")]
    All,
}

impl DisplayCount {
    pub const CHOICES: [DisplayCount; 4] = [DisplayCount::Top5, DisplayCount::Top10, DisplayCount::Top20, DisplayCount::All];

    /// Number of rows to keep, `None` for everything.
    pub fn limit(self) -> Option<usize> {
        match self {
            DisplayCount::Top5 => Some(5),
            DisplayCount::Top10 => Some(10),
            DisplayCount::Top20 => Some(20),
            DisplayCount::All => None,
        }
    }
}

impl FromStr for DisplayCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches("top") {
            "5" => Ok(DisplayCount::Top5),
            "10" => Ok(DisplayCount::Top10),
            "20" => Ok(DisplayCount::Top20),
            // 999 is the old "show everything" sentinel
            "all" | "999" => Ok(DisplayCount::All),
            other => Err(format!("Display count must be one of 5, 10, 20 or all, got: {}", other)),
        }
    }
}

/// Stored settings may hold the count as a string or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum DisplayCountInput {
    Number(u64),
    Text(String),
}

impl TryFrom<DisplayCountInput> for DisplayCount {
    type Error = String;

    fn try_from(input: DisplayCountInput) -> Result<Self, Self::Error> {
        match input {
            DisplayCountInput::Number(n) => n.to_string().parse(),
            DisplayCountInput::Text(text) => text.parse(),
        }
    }
}

impl fmt::Display for DisplayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub rank: u32,
    pub category_key: String,
    pub metric_primary: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_secondary: Option<f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedShares {
    pub ranked: Vec<CategoryShare>,
    pub total_of_all_entries: f64,
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `value / total * 100` rounded to one decimal, `0` when the total is zero.
pub fn percentage_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        round1(value / total * 100.0)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Rank `entries` by `metric`, descending.
///
/// Ties keep their input order. Percentages are shares of the whole
/// population, so changing `display` never changes the percentage of a row
/// that stays visible.
pub fn rank<F>(entries: &[CategoryEntry], metric: F, display: DisplayCount) -> RankedShares
where
    F: Fn(&CategoryEntry) -> f64,
{
    let mut scored: Vec<(f64, &CategoryEntry)> = entries
        .iter()
        .map(|entry| (finite_or_zero(metric(entry)), entry))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let total_of_all_entries: f64 = scored.iter().map(|(value, _)| value).sum();

    if let Some(limit) = display.limit() {
        scored.truncate(limit);
    }

    let ranked = scored
        .into_iter()
        .enumerate()
        .map(|(i, (value, entry))| CategoryShare {
            rank: i as u32 + 1,
            category_key: entry.category_key.clone(),
            metric_primary: entry.metric_primary,
            metric_secondary: entry.metric_secondary,
            percentage: percentage_of(value, total_of_all_entries),
        })
        .collect();

    RankedShares {
        ranked,
        total_of_all_entries,
    }
}

pub fn rank_by_metric(entries: &[CategoryEntry], metric: Metric, display: DisplayCount) -> RankedShares {
    rank(entries, |entry| metric.value(entry), display)
}

/// Fold records into one [`CategoryEntry`] per key, summing the primary and
/// secondary metrics. Entries come out in first-seen order; records without
/// a key or with a non-finite amount are skipped.
pub fn aggregate_by<T, K, P, S>(items: &[T], key: K, primary: P, secondary: S) -> Vec<CategoryEntry>
where
    K: Fn(&T) -> Option<String>,
    P: Fn(&T) -> f64,
    S: Fn(&T) -> f64,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<CategoryEntry> = Vec::new();

    for item in items {
        let Some(category) = key(item) else {
            continue;
        };
        let amount = primary(item);
        if !amount.is_finite() {
            continue;
        }
        let units = finite_or_zero(secondary(item));

        let index = *positions.entry(category.clone()).or_insert_with(|| {
            entries.push(CategoryEntry::new(category, 0.0).with_secondary(0.0));
            entries.len() - 1
        });

        let entry = &mut entries[index];
        entry.metric_primary += amount;
        entry.metric_secondary = Some(entry.metric_secondary.unwrap_or(0.0) + units);
    }

    entries
}
