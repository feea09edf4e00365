use std::collections::BTreeMap;

use chrono::Datelike;

use crate::model::{Season, Transaction};

/// Metric labels of the correlation summary, in matrix order.
pub const CORRELATION_LABELS: [&str; 3] = ["Inventory_Days", "Profit", "Profit_Margin"];

/// Pairwise Pearson coefficients over the records where every metric is
/// defined. `None` cells mark degenerate (zero-variance) pairs.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub values: [[Option<f64>; 3]; 3],
    /// How many records passed the all-metrics-defined filter.
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterSummary {
    pub year: i32,
    pub quarter: u32,
    pub sales: f64,
    pub profit: f64,
}

impl QuarterSummary {
    pub fn label(&self) -> String {
        format!("{} Q{}", self.year, self.quarter)
    }
}

/// Profit totals per (category, sub-category) cell. Combinations that
/// never occur in the data have no cell.
#[derive(Debug, Clone, Default)]
pub struct ProfitPivot {
    pub categories: Vec<String>,
    pub sub_categories: Vec<String>,
    cells: BTreeMap<(String, String), f64>,
}

impl ProfitPivot {
    pub fn get(&self, category: &str, sub_category: &str) -> Option<f64> {
        self.cells
            .get(&(category.to_string(), sub_category.to_string()))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ParetoEntry {
    pub product_name: String,
    pub profit: f64,
    /// Running share of the grand total after this product, in percent.
    pub cumulative_pct: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ParetoRanking {
    pub entries: Vec<ParetoEntry>,
    pub total_profit: f64,
}

impl ParetoRanking {
    /// Minimal number of top-ranked products whose cumulative share
    /// reaches `target_pct`. Zero for an empty ranking or a zero total.
    pub fn products_for_share(&self, target_pct: f64) -> usize {
        if self.entries.is_empty() || self.total_profit == 0.0 {
            return 0;
        }
        self.entries
            .iter()
            .position(|e| e.cumulative_pct >= target_pct - 1e-9)
            .map(|i| i + 1)
            .unwrap_or(self.entries.len())
    }
}

#[derive(Debug, Clone)]
pub struct SlowMoverGroup {
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    pub mean_inventory_days: f64,
    /// Records with a defined inventory-days value in this group.
    pub orders: usize,
}

#[derive(Debug, Clone)]
pub struct SeasonalProfit {
    pub season: Season,
    pub category: String,
    pub profit: f64,
}

/// Stateless summary reductions over the classified batch. Every one of
/// them returns an empty summary for an empty batch.
pub struct Aggregator;

impl Aggregator {
    /// Correlation among inventory days, profit, and profit margin,
    /// restricted to records where all three are defined.
    pub fn correlation_matrix(records: &[Transaction]) -> CorrelationMatrix {
        let mut days = Vec::new();
        let mut profit = Vec::new();
        let mut margin = Vec::new();
        for t in records {
            if let (Some(d), Some(m)) = (t.inventory_days, t.profit_margin) {
                if d.is_finite() && m.is_finite() && t.profit.is_finite() {
                    days.push(d);
                    profit.push(t.profit);
                    margin.push(m);
                }
            }
        }
        let columns: [&[f64]; 3] = [&days, &profit, &margin];
        let mut values = [[None; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                values[i][j] = pearson(columns[i], columns[j]);
            }
        }
        CorrelationMatrix {
            values,
            samples: days.len(),
        }
    }

    /// Sales and profit totals per calendar quarter, oldest first.
    /// Records without a parsed order date are left out.
    pub fn quarterly_trend(records: &[Transaction]) -> Vec<QuarterSummary> {
        let mut buckets: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
        for t in records {
            let Some(date) = t.order_date else { continue };
            let key = (date.year(), (date.month() - 1) / 3 + 1);
            let entry = buckets.entry(key).or_insert((0.0, 0.0));
            entry.0 += t.sales;
            entry.1 += t.profit;
        }
        buckets
            .into_iter()
            .map(|((year, quarter), (sales, profit))| QuarterSummary {
                year,
                quarter,
                sales,
                profit,
            })
            .collect()
    }

    pub fn profit_pivot(records: &[Transaction]) -> ProfitPivot {
        let mut cells: BTreeMap<(String, String), f64> = BTreeMap::new();
        for t in records {
            *cells
                .entry((t.category.clone(), t.sub_category.clone()))
                .or_insert(0.0) += t.profit;
        }
        // Keys iterate sorted by category first, so a plain dedup works.
        let mut categories: Vec<String> = cells.keys().map(|(c, _)| c.clone()).collect();
        categories.dedup();
        let mut sub_categories: Vec<String> = cells.keys().map(|(_, s)| s.clone()).collect();
        sub_categories.sort();
        sub_categories.dedup();
        ProfitPivot {
            categories,
            sub_categories,
            cells,
        }
    }

    /// Products ranked by total profit, highest first, with the running
    /// cumulative share of the grand total. Ties rank alphabetically.
    pub fn pareto_ranking(records: &[Transaction]) -> ParetoRanking {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for t in records {
            *totals.entry(t.product_name.clone()).or_insert(0.0) += t.profit;
        }
        let total_profit: f64 = totals.values().sum();
        let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
        // Stable sort over the name-ordered totals keeps ties deterministic.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut running = 0.0;
        let entries = ranked
            .into_iter()
            .map(|(product_name, profit)| {
                running += profit;
                let cumulative_pct = if total_profit == 0.0 {
                    0.0
                } else {
                    running / total_profit * 100.0
                };
                ParetoEntry {
                    product_name,
                    profit,
                    cumulative_pct,
                }
            })
            .collect();
        ParetoRanking {
            entries,
            total_profit,
        }
    }

    /// Top `limit` (category, sub-category, product) groups by mean
    /// inventory days. Groups with no defined value drop out entirely.
    pub fn top_slow_movers(records: &[Transaction], limit: usize) -> Vec<SlowMoverGroup> {
        let mut groups: BTreeMap<(String, String, String), (f64, usize)> = BTreeMap::new();
        for t in records {
            let Some(days) = t.inventory_days else { continue };
            if !days.is_finite() {
                continue;
            }
            let key = (
                t.category.clone(),
                t.sub_category.clone(),
                t.product_name.clone(),
            );
            let entry = groups.entry(key).or_insert((0.0, 0));
            entry.0 += days;
            entry.1 += 1;
        }
        let mut movers: Vec<SlowMoverGroup> = groups
            .into_iter()
            .map(|((category, sub_category, product_name), (sum, count))| SlowMoverGroup {
                category,
                sub_category,
                product_name,
                mean_inventory_days: sum / count as f64,
                orders: count,
            })
            .collect();
        movers.sort_by(|a, b| b.mean_inventory_days.total_cmp(&a.mean_inventory_days));
        movers.truncate(limit);
        movers
    }

    /// Profit per (season, category), season order Winter through Fall.
    /// Records without a season (null date) are left out.
    pub fn seasonal_profit(records: &[Transaction]) -> Vec<SeasonalProfit> {
        let mut buckets: BTreeMap<(Season, String), f64> = BTreeMap::new();
        for t in records {
            let Some(season) = t.season else { continue };
            *buckets.entry((season, t.category.clone())).or_insert(0.0) += t.profit;
        }
        buckets
            .into_iter()
            .map(|((season, category), profit)| SeasonalProfit {
                season,
                category,
                profit,
            })
            .collect()
    }
}

/// Pearson correlation coefficient between two equally long slices.
/// Returns None for empty slices or when either side has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let numerator: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let denominator_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let denominator_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    let denominator = (denominator_x * denominator_y).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}
