//! Terminal rendering of the analysis summaries.

use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::analyzer::Thresholds;
use crate::analyzer::aggregates::{
    CORRELATION_LABELS, CorrelationMatrix, ParetoRanking, ProfitPivot, QuarterSummary,
    SeasonalProfit, SlowMoverGroup,
};
use crate::model::{Action, Transaction};

const EMPTY_NOTE: &str = "No results.";
const PARETO_HEAD: usize = 10;

#[derive(Tabled)]
struct KeyValueRow {
    #[tabled(rename = "Metric")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct QuarterRow {
    #[tabled(rename = "Quarter")]
    quarter: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Profit")]
    profit: String,
}

#[derive(Tabled)]
struct ParetoRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Cumulative %")]
    cumulative: String,
}

#[derive(Tabled)]
struct SlowMoverRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Sub-Category")]
    sub_category: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Mean Inventory Days")]
    mean_days: String,
    #[tabled(rename = "Orders")]
    orders: usize,
}

#[derive(Tabled)]
struct SeasonalRow {
    #[tabled(rename = "Season")]
    season: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Profit")]
    profit: String,
}

/// Cutoffs plus how the five labels were handed out.
pub fn print_classification(records: &[Transaction], thresholds: &Thresholds) {
    print_section("Classification");
    let mut rows = vec![
        KeyValueRow {
            key: "Slow-mover cutoff (inventory days)".to_string(),
            value: fmt_opt(thresholds.slow_inventory_days),
        },
        KeyValueRow {
            key: "Overstock cutoff (quantity)".to_string(),
            value: fmt_opt(thresholds.overstock_quantity),
        },
    ];
    for action in Action::ALL {
        let count = records.iter().filter(|t| t.action == action).count();
        rows.push(KeyValueRow {
            key: action.label().to_string(),
            value: count.to_string(),
        });
    }
    print_table(&rows);
}

pub fn print_correlation(matrix: &CorrelationMatrix) {
    print_section("Correlation");
    if matrix.samples == 0 {
        println!("{EMPTY_NOTE}");
        return;
    }
    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(CORRELATION_LABELS.iter().map(|l| l.to_string()));
    builder.push_record(header);
    for (i, label) in CORRELATION_LABELS.iter().enumerate() {
        let mut row = vec![label.to_string()];
        row.extend(matrix.values[i].iter().map(|v| fmt_corr(*v)));
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::rounded()).to_string());
    println!("({} records with all metrics defined)", matrix.samples);
}

pub fn print_quarterly(trend: &[QuarterSummary]) {
    print_section("Quarterly sales and profit");
    let rows: Vec<QuarterRow> = trend
        .iter()
        .map(|q| QuarterRow {
            quarter: q.label(),
            sales: fmt_f64(q.sales),
            profit: fmt_f64(q.profit),
        })
        .collect();
    print_table(&rows);
}

pub fn print_pivot(pivot: &ProfitPivot) {
    print_section("Profit by category and sub-category");
    if pivot.is_empty() {
        println!("{EMPTY_NOTE}");
        return;
    }
    let mut builder = Builder::default();
    let mut header = vec!["Category".to_string()];
    header.extend(pivot.sub_categories.iter().cloned());
    builder.push_record(header);
    for category in &pivot.categories {
        let mut row = vec![category.clone()];
        for sub in &pivot.sub_categories {
            row.push(
                pivot
                    .get(category, sub)
                    .map(fmt_f64)
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::rounded()).to_string());
}

pub fn print_pareto(ranking: &ParetoRanking, target_pct: f64) {
    print_section("Pareto ranking by product profit");
    let rows: Vec<ParetoRow> = ranking
        .entries
        .iter()
        .take(PARETO_HEAD)
        .enumerate()
        .map(|(i, e)| ParetoRow {
            rank: i + 1,
            product: e.product_name.clone(),
            profit: fmt_f64(e.profit),
            cumulative: fmt_f64(e.cumulative_pct),
        })
        .collect();
    print_table(&rows);
    if !ranking.entries.is_empty() {
        println!(
            "{} of {} products cover {:.0}% of total profit.",
            ranking.products_for_share(target_pct),
            ranking.entries.len(),
            target_pct
        );
    }
}

pub fn print_slow_movers(movers: &[SlowMoverGroup]) {
    print_section("Top slow movers");
    let rows: Vec<SlowMoverRow> = movers
        .iter()
        .map(|m| SlowMoverRow {
            category: m.category.clone(),
            sub_category: m.sub_category.clone(),
            product: m.product_name.clone(),
            mean_days: fmt_f64(m.mean_inventory_days),
            orders: m.orders,
        })
        .collect();
    print_table(&rows);
}

pub fn print_seasonal(seasonal: &[SeasonalProfit]) {
    print_section("Seasonal profit by category");
    let rows: Vec<SeasonalRow> = seasonal
        .iter()
        .map(|s| SeasonalRow {
            season: s.season.name().to_string(),
            category: s.category.clone(),
            profit: fmt_f64(s.profit),
        })
        .collect();
    print_table(&rows);
}

fn print_section(title: &str) {
    println!("\n{title}");
}

fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{EMPTY_NOTE}");
        return;
    }
    println!("{}", Table::new(rows).with(Style::rounded()).to_string());
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.2}")
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(fmt_f64).unwrap_or_else(|| "-".to_string())
}

fn fmt_corr(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "-".to_string())
}
