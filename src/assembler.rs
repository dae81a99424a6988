//! # View Model Assembler Module
//!
//! Composes bucketing, ranking and taxonomy results into the exact shapes the
//! dashboard charts and cards bind to
//!
//! ## Key Components
//! - [`ViewModelAssembler`] - Holds the format rules, bucketer and taxonomy
//! - [`TrendChartView`] - Line/bar chart series, or a placeholder for incomplete ranges
//! - [`RankingView`] - Top-N table by brand or store
//! - [`CategoryCardsView`] - Fixed grid of product-type cards
//! - [`OverviewCards`] - Headline totals
//! - [`DashboardView`] - Everything above for one request

use serde::Serialize;

use crate::bucketer::{Granularity, PeriodBucketer, TrendPoint};
use crate::date_range::DateRange;
use crate::filters::FilterState;
use crate::formatting::FormatRules;
use crate::ranking::{self, CategoryEntry, CategoryShare, DisplayCount, Metric, RankedShares, percentage_of};
use crate::records::{Dimension, Sale};
use crate::taxonomy::{Taxonomy, index_by_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartStatus {
    /// The date range is incomplete; show a placeholder, do not query
    AwaitingRange,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPointView {
    pub period_key: String,
    pub total_value: f64,
    pub count: u64,
    pub formatted_total: String,
    pub formatted_count: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendChartView {
    pub status: ChartStatus,
    pub granularity: Granularity,
    pub range: DateRange,
    pub points: Vec<TrendPointView>,
    pub total_value: f64,
    pub formatted_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRow {
    pub rank: u32,
    pub category_key: String,
    pub metric_primary: f64,
    pub metric_secondary: Option<f64>,
    pub percentage: f64,
    pub formatted_value: String,
    pub formatted_units: String,
    pub formatted_percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingView {
    pub dimension: Dimension,
    pub metric: Metric,
    pub display_count: DisplayCount,
    pub rows: Vec<RankingRow>,
    pub total_of_all_entries: f64,
    pub formatted_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCard {
    pub category_key: String,
    pub metric_primary: f64,
    pub metric_secondary: f64,
    pub percentage: f64,
    pub formatted_value: String,
    pub formatted_units: String,
    pub formatted_percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCardsView {
    pub cards: Vec<CategoryCard>,
    pub total_value: f64,
    pub formatted_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewCards {
    pub total_sales: f64,
    pub sale_count: u64,
    pub units_sold: f64,
    pub average_ticket: f64,
    pub formatted_total_sales: String,
    pub formatted_sale_count: String,
    pub formatted_units_sold: String,
    pub formatted_average_ticket: String,
}

/// Everything the statistics screen needs for one user selection.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub range: DateRange,
    pub granularity: Granularity,
    pub display_count: DisplayCount,
    pub metric: Metric,
    pub filters: FilterState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub range: DateRange,
    pub filters: FilterState,
    pub overview: OverviewCards,
    pub trend: TrendChartView,
    pub by_brand: RankingView,
    pub by_store: RankingView,
    pub by_product_type: CategoryCardsView,
}

#[derive(Debug, Clone)]
pub struct ViewModelAssembler {
    rules: FormatRules,
    bucketer: PeriodBucketer,
    taxonomy: Taxonomy,
}

impl Default for ViewModelAssembler {
    fn default() -> Self {
        Self::new(FormatRules::default(), PeriodBucketer::default(), Taxonomy::default())
    }
}

impl ViewModelAssembler {
    pub fn new(rules: FormatRules, bucketer: PeriodBucketer, taxonomy: Taxonomy) -> Self {
        Self {
            rules,
            bucketer,
            taxonomy,
        }
    }

    pub fn rules(&self) -> &FormatRules {
        &self.rules
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Sales inside `range` (by local date) that pass every active filter.
    pub fn select(&self, sales: &[Sale], range: &DateRange, filters: &FilterState) -> Vec<Sale> {
        sales
            .iter()
            .filter(|sale| range.contains(self.bucketer.local_date(sale.timestamp)))
            .filter(|sale| filters.matches(*sale))
            .cloned()
            .collect()
    }

    pub fn trend_view(&self, points: Vec<TrendPoint>, granularity: Granularity, range: DateRange) -> TrendChartView {
        let status = if range.is_complete() {
            ChartStatus::Ready
        } else {
            ChartStatus::AwaitingRange
        };
        let total_value: f64 = points.iter().map(|p| p.total_value).sum();
        let points = points
            .into_iter()
            .map(|p| TrendPointView {
                formatted_total: self.rules.currency(p.total_value),
                formatted_count: self.rules.count(p.count as f64),
                period_key: p.period_key,
                total_value: p.total_value,
                count: p.count,
            })
            .collect();

        TrendChartView {
            status,
            granularity,
            range,
            points,
            total_value,
            formatted_total: self.rules.currency(total_value),
        }
    }

    pub fn ranking_view(
        &self,
        shares: RankedShares,
        dimension: Dimension,
        metric: Metric,
        display_count: DisplayCount,
    ) -> RankingView {
        let rows = shares.ranked.into_iter().map(|share| self.ranking_row(share)).collect();
        RankingView {
            dimension,
            metric,
            display_count,
            rows,
            total_of_all_entries: shares.total_of_all_entries,
            formatted_total: self.metric_text(metric, shares.total_of_all_entries),
        }
    }

    /// Cards for entries already merged against the taxonomy. Percentages
    /// are shares of the card total.
    pub fn cards_view(&self, merged: Vec<CategoryEntry>) -> CategoryCardsView {
        let total_value: f64 = merged.iter().map(|e| e.metric_primary).sum();
        let cards = merged
            .into_iter()
            .map(|entry| {
                let units = entry.metric_secondary.unwrap_or(0.0);
                let percentage = percentage_of(entry.metric_primary, total_value);
                CategoryCard {
                    formatted_value: self.rules.currency(entry.metric_primary),
                    formatted_units: self.rules.count(units),
                    formatted_percentage: self.rules.percentage(percentage),
                    category_key: entry.category_key,
                    metric_primary: entry.metric_primary,
                    metric_secondary: units,
                    percentage,
                }
            })
            .collect();

        CategoryCardsView {
            cards,
            total_value,
            formatted_total: self.rules.currency(total_value),
        }
    }

    pub fn trend_chart(&self, sales: &[Sale], granularity: Granularity, range: &DateRange) -> TrendChartView {
        let points = self
            .bucketer
            .bucketize_by(sales, granularity, range, |s| Some(s.timestamp), |s| Some(s.amount));
        self.trend_view(points, granularity, *range)
    }

    pub fn category_entries(&self, sales: &[Sale], dimension: Dimension) -> Vec<CategoryEntry> {
        ranking::aggregate_by(sales, |s| dimension.key_of(s), |s| s.amount, |s| s.units)
    }

    pub fn ranking(&self, sales: &[Sale], dimension: Dimension, metric: Metric, display_count: DisplayCount) -> RankingView {
        let entries = self.category_entries(sales, dimension);
        let shares = ranking::rank_by_metric(&entries, metric, display_count);
        self.ranking_view(shares, dimension, metric, display_count)
    }

    pub fn product_type_cards(&self, sales: &[Sale]) -> CategoryCardsView {
        let entries = self.category_entries(sales, Dimension::ProductType);
        let merged = self.taxonomy.merge(&index_by_key(entries));
        self.cards_view(merged)
    }

    pub fn overview(&self, sales: &[Sale]) -> OverviewCards {
        let total_sales: f64 = sales.iter().map(|s| s.amount).sum();
        let units_sold: f64 = sales.iter().map(|s| s.units).sum();
        let sale_count = sales.len() as u64;
        let average_ticket = if sale_count == 0 {
            0.0
        } else {
            total_sales / sale_count as f64
        };

        OverviewCards {
            total_sales,
            sale_count,
            units_sold,
            average_ticket,
            formatted_total_sales: self.rules.currency(total_sales),
            formatted_sale_count: self.rules.count(sale_count as f64),
            formatted_units_sold: self.rules.count(units_sold),
            formatted_average_ticket: self.rules.currency(average_ticket),
        }
    }

    pub fn dashboard(&self, sales: &[Sale], request: &DashboardRequest) -> DashboardView {
        let selected = self.select(sales, &request.range, &request.filters);
        DashboardView {
            range: request.range,
            filters: request.filters.active(),
            overview: self.overview(&selected),
            trend: self.trend_chart(&selected, request.granularity, &request.range),
            by_brand: self.ranking(&selected, Dimension::Brand, request.metric, request.display_count),
            by_store: self.ranking(&selected, Dimension::Store, request.metric, request.display_count),
            by_product_type: self.product_type_cards(&selected),
        }
    }

    fn ranking_row(&self, share: CategoryShare) -> RankingRow {
        RankingRow {
            rank: share.rank,
            formatted_value: self.rules.currency(share.metric_primary),
            formatted_units: self.rules.count(share.metric_secondary.unwrap_or(0.0)),
            formatted_percentage: self.rules.percentage(share.percentage),
            category_key: share.category_key,
            metric_primary: share.metric_primary,
            metric_secondary: share.metric_secondary,
            percentage: share.percentage,
        }
    }

    fn metric_text(&self, metric: Metric, value: f64) -> String {
        match metric {
            Metric::Amount => self.rules.currency(value),
            Metric::Units => self.rules.count(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sale(day: u32, amount: f64, brand: &str, store: &str, product_type: &str) -> Sale {
        Sale {
            id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            amount,
            units: 1.0,
            brand: Some(brand.to_string()),
            store: Some(store.to_string()),
            product_type: Some(product_type.to_string()),
        }
    }

    fn sample() -> Vec<Sale> {
        vec![
            sale(2, 100.0, "X", "Centro", "FRAMES"),
            sale(3, 300.0, "Y", "Norte", "SUNGLASSES"),
            sale(3, 50.0, "Y", "Centro", "GIFT_CARDS"),
            sale(20, 999.0, "Z", "Sur", "FRAMES"),
        ]
    }

    fn january_first_week() -> DateRange {
        DateRange::parse(Some("2024-01-01"), Some("2024-01-07")).unwrap()
    }

    #[test]
    fn test_trend_view_placeholder_for_incomplete_range() {
        let assembler = ViewModelAssembler::default();
        let open = DateRange::parse(Some("2024-01-01"), None).unwrap();
        let view = assembler.trend_chart(&sample(), Granularity::Day, &open);

        assert_eq!(view.status, ChartStatus::AwaitingRange);
        assert!(view.points.is_empty());
        assert_eq!(view.formatted_total, "0.00 €");
    }

    #[test]
    fn test_trend_view_formats_points() {
        let assembler = ViewModelAssembler::default();
        let view = assembler.trend_chart(&sample(), Granularity::Day, &january_first_week());

        assert_eq!(view.status, ChartStatus::Ready);
        assert_eq!(view.points.len(), 7);
        assert_eq!(view.points[2].period_key, "2024-01-03");
        assert_eq!(view.points[2].formatted_total, "350.00 €");
        assert_eq!(view.points[2].formatted_count, "2");
        assert_eq!(view.total_value, 450.0);
    }

    #[test]
    fn test_dashboard_composes_all_views() {
        let assembler = ViewModelAssembler::default();
        let request = DashboardRequest {
            range: january_first_week(),
            display_count: DisplayCount::All,
            ..DashboardRequest::default()
        };
        let view = assembler.dashboard(&sample(), &request);

        assert_eq!(view.overview.sale_count, 3);
        assert_eq!(view.overview.formatted_total_sales, "450.00 €");
        assert_eq!(view.overview.formatted_average_ticket, "150.00 €");

        let brands: Vec<(&str, f64)> = view
            .by_brand
            .rows
            .iter()
            .map(|r| (r.category_key.as_str(), r.percentage))
            .collect();
        assert_eq!(brands, vec![("Y", 77.8), ("X", 22.2)]);

        assert_eq!(view.by_store.rows[0].category_key, "Norte");
        assert_eq!(view.by_product_type.cards.len(), 6);
        assert_eq!(view.by_product_type.cards[0].formatted_value, "100.00 €");
        assert_eq!(view.by_product_type.cards[0].percentage, 25.0);
        assert_eq!(view.by_product_type.cards[2].metric_primary, 0.0);
    }

    #[test]
    fn test_dashboard_applies_filters() {
        let assembler = ViewModelAssembler::default();
        let request = DashboardRequest {
            range: january_first_week(),
            filters: FilterState::from_pairs([("store", "centro")]),
            ..DashboardRequest::default()
        };
        let view = assembler.dashboard(&sample(), &request);
        assert_eq!(view.overview.sale_count, 2);
        assert_eq!(view.overview.total_sales, 150.0);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["filters"]["store"], "centro");
        assert_eq!(json["trend"]["points"][0]["periodKey"], "2024-01-01");
        assert_eq!(json["byBrand"]["rows"][0]["categoryKey"], "X");
    }

    #[test]
    fn test_open_range_limits_only_the_trend() {
        let assembler = ViewModelAssembler::default();
        let request = DashboardRequest {
            range: DateRange::parse(Some("2024-01-03"), None).unwrap(),
            display_count: DisplayCount::All,
            ..DashboardRequest::default()
        };
        let view = assembler.dashboard(&sample(), &request);

        assert_eq!(view.trend.status, ChartStatus::AwaitingRange);
        assert!(view.trend.points.is_empty());
        assert_eq!(view.overview.sale_count, 3);
        assert_eq!(view.by_brand.total_of_all_entries, 1349.0);
    }

    #[test]
    fn test_overview_of_nothing_is_zero() {
        let overview = ViewModelAssembler::default().overview(&[]);
        assert_eq!(overview.average_ticket, 0.0);
        assert_eq!(overview.formatted_sale_count, "0");
    }

    #[test]
    fn test_ranking_view_formats_totals_by_metric() {
        let assembler = ViewModelAssembler::default();
        let view = assembler.ranking(&sample(), Dimension::Brand, Metric::Units, DisplayCount::Top5);
        assert_eq!(view.formatted_total, "4");
        assert_eq!(view.rows[0].category_key, "Y");
        assert_eq!(view.rows[0].formatted_percentage, "50.0%");
    }
}
