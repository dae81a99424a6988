//! # Table Display Module
//!
//! Terminal rendering of the dashboard view models
//!
//! ## Key Components
//! - [`format_trend_table`] - One row per period bucket
//! - [`format_ranking_table`] - Top-N rows with share bars
//! - [`format_category_cards`] - Fixed product-type grid
//! - [`format_overview`] - Headline totals box

use crate::assembler::{CategoryCardsView, ChartStatus, OverviewCards, RankingView, TrendChartView};
use crate::date_range::format_date;

const GRAY: &str = "\x1b[90m";
const RESET: &str = "\x1b[39m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";

fn banner(title: &str) -> String {
    let width = title.chars().count() + 4;
    let mut output = String::new();
    output.push('\n');
    output.push_str(&format!(" ╭{}╮\n", "─".repeat(width)));
    output.push_str(&format!(" │  {}  │\n", title));
    output.push_str(&format!(" ╰{}╯\n", "─".repeat(width)));
    output.push('\n');
    output
}

fn rule(left: char, mid: char, right: char, widths: &[usize]) -> String {
    let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{GRAY}{left}{}{right}{RESET}\n", cells.join(&mid.to_string()))
}

fn header_row(titles: &[&str], widths: &[usize]) -> String {
    let mut row = format!("{GRAY}│{RESET}");
    for (title, width) in titles.iter().zip(widths) {
        row.push_str(&format!("{CYAN} {:<width$} {RESET}{GRAY}│{RESET}", title, width = *width));
    }
    row.push('\n');
    row
}

/// First cell left-aligned, the rest right-aligned.
fn data_row(cells: &[String], widths: &[usize]) -> String {
    let mut row = format!("{GRAY}│{RESET}");
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i == 0 {
            row.push_str(&format!(" {:<width$} {GRAY}│{RESET}", cell, width = *width));
        } else {
            row.push_str(&format!(" {:>width$} {GRAY}│{RESET}", cell, width = *width));
        }
    }
    row.push('\n');
    row
}

fn column_widths(titles: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(title.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn render_table(titles: &[&str], rows: &[Vec<String>], footer: Option<Vec<String>>) -> String {
    let mut all_rows = rows.to_vec();
    if let Some(footer) = &footer {
        all_rows.push(footer.clone());
    }
    let widths = column_widths(titles, &all_rows);

    let mut output = String::new();
    output.push_str(&rule('┌', '┬', '┐', &widths));
    output.push_str(&header_row(titles, &widths));
    for row in rows {
        output.push_str(&rule('├', '┼', '┤', &widths));
        output.push_str(&data_row(row, &widths));
    }
    if let Some(footer) = footer {
        output.push_str(&rule('├', '┼', '┤', &widths));
        output.push_str(&data_row(&footer, &widths));
    }
    output.push_str(&rule('└', '┴', '┘', &widths));
    output
}

fn share_bar(percentage: f64) -> String {
    let blocks = (percentage / 5.0).round().clamp(0.0, 20.0) as usize;
    "█".repeat(blocks)
}

pub fn format_trend_table(view: &TrendChartView) -> String {
    let mut output = banner(&format!("Sales Trend - by {}", view.granularity));

    if view.status == ChartStatus::AwaitingRange {
        output.push_str("Select both a start and an end date to see the trend.\n");
        return output;
    }

    let rows: Vec<Vec<String>> = view
        .points
        .iter()
        .map(|p| vec![p.period_key.clone(), p.formatted_count.clone(), p.formatted_total.clone()])
        .collect();
    let count: u64 = view.points.iter().map(|p| p.count).sum();
    let footer = vec!["Total".to_string(), count.to_string(), view.formatted_total.clone()];

    output.push_str(&render_table(&["Period", "Sales", "Amount"], &rows, Some(footer)));

    if let Some((start, end)) = view.range.bounds() {
        output.push_str(&format!("\n{GREEN}📅 {} → {}{RESET}\n", format_date(start), format_date(end)));
    }
    output
}

pub fn format_ranking_table(view: &RankingView) -> String {
    let title = match view.display_count.limit() {
        Some(n) => format!("Top {} by {}", n, view.dimension.title()),
        None => format!("All by {}", view.dimension.title()),
    };
    let mut output = banner(&title);

    if view.rows.is_empty() {
        output.push_str("No data found for the selected filters.\n");
        return output;
    }

    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|r| {
            vec![
                r.rank.to_string(),
                r.category_key.clone(),
                r.formatted_value.clone(),
                r.formatted_units.clone(),
                r.formatted_percentage.clone(),
                share_bar(r.percentage),
            ]
        })
        .collect();

    output.push_str(&render_table(
        &["#", view.dimension.title(), "Amount", "Units", "Share", ""],
        &rows,
        None,
    ));
    output.push_str(&format!("\n{GREEN}📊 Total ({} entries): {}{RESET}\n", view.rows.len(), view.formatted_total));
    output
}

pub fn format_category_cards(view: &CategoryCardsView) -> String {
    let mut output = banner("Sales by Product Type");

    let rows: Vec<Vec<String>> = view
        .cards
        .iter()
        .map(|c| {
            vec![
                c.category_key.clone(),
                c.formatted_value.clone(),
                c.formatted_units.clone(),
                c.formatted_percentage.clone(),
            ]
        })
        .collect();
    let footer = vec![
        "Total".to_string(),
        view.formatted_total.clone(),
        String::new(),
        String::new(),
    ];

    output.push_str(&render_table(&["Product Type", "Amount", "Units", "Share"], &rows, Some(footer)));
    output
}

pub fn format_overview(overview: &OverviewCards) -> String {
    let mut output = banner("Sales Overview");
    let rows = vec![
        vec!["Total sales".to_string(), overview.formatted_total_sales.clone()],
        vec!["Sales".to_string(), overview.formatted_sale_count.clone()],
        vec!["Units sold".to_string(), overview.formatted_units_sold.clone()],
        vec!["Average ticket".to_string(), overview.formatted_average_ticket.clone()],
    ];
    output.push_str(&render_table(&["Metric", "Value"], &rows, None));
    output
}
