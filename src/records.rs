//! # Records Module
//!
//! Loads exported sale records (JSON array or JSONL) into typed values
//!
//! ## Key Components
//! - [`RawSale`] - Lenient row shape as exported by the API
//! - [`Sale`] - Validated sale with a UTC timestamp and numeric metrics
//! - [`Dimension`] - Categorical field a breakdown groups by
//! - [`load_sales`] - Read a file, skipping malformed rows

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::date_range::parse_date;
use crate::filters::Filterable;
use crate::taxonomy::ProductType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSale {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "date", alias = "createdAt")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "total", alias = "totalSales")]
    pub amount: Option<f64>,
    #[serde(default, alias = "units")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, alias = "storeName")]
    pub store: Option<String>,
    #[serde(default, alias = "type")]
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub units: f64,
    pub brand: Option<String>,
    pub store: Option<String>,
    pub product_type: Option<String>,
}

impl Filterable for Sale {
    fn filter_field(&self, key: &str) -> Option<String> {
        match key {
            "brand" => Some(self.brand.clone().unwrap_or_default()),
            "store" => Some(self.store.clone().unwrap_or_default()),
            "productType" | "product_type" => Some(self.product_type.clone().unwrap_or_default()),
            _ => None,
        }
    }
}

/// Categorical field used for breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    #[default]
    Brand,
    Store,
    ProductType,
}

impl Dimension {
    pub fn key_of(self, sale: &Sale) -> Option<String> {
        let value = match self {
            Dimension::Brand => sale.brand.as_deref(),
            Dimension::Store => sale.store.as_deref(),
            Dimension::ProductType => sale.product_type.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    }

    pub fn title(self) -> &'static str {
        match self {
            Dimension::Brand => "Brand",
            Dimension::Store => "Store",
            Dimension::ProductType => "Product Type",
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadedSales {
    pub sales: Vec<Sale>,
    pub skipped: usize,
}

/// Parse a timestamp as RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` local time,
/// or a bare date (local midnight). Local means `timezone`.
pub fn parse_timestamp(value: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| parse_date(value).ok().and_then(|d| d.and_hms_opt(0, 0, 0)))?;

    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

impl RawSale {
    /// `None` when the timestamp or amount is missing or unusable.
    pub fn into_sale(self, timezone: Tz) -> Option<Sale> {
        let timestamp = parse_timestamp(self.timestamp.as_deref()?, timezone)?;
        let amount = self.amount.filter(|a| a.is_finite())?;
        let units = self.quantity.filter(|q| q.is_finite()).unwrap_or(1.0);

        let product_type = self.product_type.map(|raw| match ProductType::from_key(&raw) {
            Some(known) => known.key().to_string(),
            None => raw,
        });

        Some(Sale {
            id: self.id,
            timestamp,
            amount,
            units,
            brand: self.brand,
            store: self.store,
            product_type,
        })
    }
}

fn convert_value(value: serde_json::Value, timezone: Tz) -> Option<Sale> {
    serde_json::from_value::<RawSale>(value)
        .ok()
        .and_then(|raw| raw.into_sale(timezone))
}

/// Parse a JSON array or JSONL document. Rows that fail to parse or lack a
/// timestamp/amount are counted as skipped rather than failing the load.
pub fn parse_sales(content: &str, timezone: Tz) -> Result<LoadedSales> {
    let mut loaded = LoadedSales::default();

    if content.trim_start().starts_with('[') {
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(content).context("Failed to parse JSON array of sales")?;
        for row in rows {
            match convert_value(row, timezone) {
                Some(sale) => loaded.sales.push(sale),
                None => loaded.skipped += 1,
            }
        }
    } else {
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let sale = serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|value| convert_value(value, timezone));
            match sale {
                Some(sale) => loaded.sales.push(sale),
                None => {
                    debug!("Skipping malformed sale on line {}", line_no + 1);
                    loaded.skipped += 1;
                }
            }
        }
    }

    if loaded.skipped > 0 {
        debug!("Loaded {} sales, skipped {} malformed rows", loaded.sales.len(), loaded.skipped);
    }

    Ok(loaded)
}

pub fn load_sales(path: &Path, timezone: Tz) -> Result<LoadedSales> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sales file {}", path.display()))?;
    parse_sales(&content, timezone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_jsonl_skips_malformed_rows() {
        let content = r#"
{"id":"s1","timestamp":"2024-01-05T10:00:00Z","amount":120.5,"quantity":2,"brand":"Ray-Ban","store":"Centro","productType":"sunglasses"}
not json at all
{"id":"s2","amount":50}
{"id":"s3","timestamp":"2024-01-06","totalSales":80,"brand":"Oakley"}
{"id":"s4","timestamp":"2024-01-07T09:00:00Z","amount":"12"}
"#;
        let loaded = parse_sales(content, Tz::UTC).unwrap();

        assert_eq!(loaded.sales.len(), 2);
        assert_eq!(loaded.skipped, 3);

        let first = &loaded.sales[0];
        assert_eq!(first.amount, 120.5);
        assert_eq!(first.units, 2.0);
        assert_eq!(first.product_type.as_deref(), Some("SUNGLASSES"));

        let second = &loaded.sales[1];
        assert_eq!(second.units, 1.0);
        assert_eq!(second.timestamp, Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_json_array() {
        let content = r#"[
            {"createdAt":"2024-02-01T12:00:00+01:00","total":10,"storeName":"Norte"},
            {"timestamp":"bad","amount":5}
        ]"#;
        let loaded = parse_sales(content, Tz::UTC).unwrap();
        assert_eq!(loaded.sales.len(), 1);
        assert_eq!(loaded.skipped, 1);
        assert_eq!(loaded.sales[0].store.as_deref(), Some("Norte"));
        assert_eq!(
            loaded.sales[0].timestamp,
            Utc.with_ymd_and_hms(2024, 2, 1, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bare_dates_are_local_midnight() {
        let madrid: Tz = "Europe/Madrid".parse().unwrap();
        let ts = parse_timestamp("2024-07-01", madrid).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 30, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_unknown_product_type_is_kept_verbatim() {
        let raw = RawSale {
            id: None,
            timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            amount: Some(1.0),
            quantity: None,
            brand: None,
            store: None,
            product_type: Some("Gift card".to_string()),
        };
        let sale = raw.into_sale(Tz::UTC).unwrap();
        assert_eq!(sale.product_type.as_deref(), Some("Gift card"));
    }

    #[test]
    fn test_dimension_key_ignores_blank_values() {
        let sale = Sale {
            id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            amount: 1.0,
            units: 1.0,
            brand: Some("  ".to_string()),
            store: Some(" Centro ".to_string()),
            product_type: None,
        };
        assert_eq!(Dimension::Brand.key_of(&sale), None);
        assert_eq!(Dimension::Store.key_of(&sale).as_deref(), Some("Centro"));
        assert_eq!(sale.filter_field("productType").as_deref(), Some(""));
        assert_eq!(sale.filter_field("from"), None);
    }

    #[test]
    fn test_load_sales_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"timestamp":"2024-03-01T08:00:00Z","amount":99.9}}"#).unwrap();
        let loaded = load_sales(file.path(), Tz::UTC).unwrap();
        assert_eq!(loaded.sales.len(), 1);

        let missing = load_sales(Path::new("/definitely/not/here.jsonl"), Tz::UTC);
        assert!(missing.is_err());
    }
}
