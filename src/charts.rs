//! PNG chart rendering of the analysis summaries.
//!
//! Presentation only: the CSV exports are written before any chart, so a
//! rendering failure never affects the durable outputs. Summaries with no
//! data skip their chart instead of drawing an empty frame.

use std::path::{Path, PathBuf};

use anyhow::Result;
use plotters::prelude::*;

use crate::analyzer::aggregates::{
    CORRELATION_LABELS, CorrelationMatrix, ParetoRanking, ProfitPivot, QuarterSummary,
    SeasonalProfit, SlowMoverGroup,
};
use crate::model::{Season, Transaction};

const CHART_DIR: &str = "charts";

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Borrowed views of everything the charts draw from.
pub struct ChartInputs<'a> {
    pub records: &'a [Transaction],
    pub correlation: &'a CorrelationMatrix,
    pub quarterly: &'a [QuarterSummary],
    pub pivot: &'a ProfitPivot,
    pub pareto: &'a ParetoRanking,
    pub slow_movers: &'a [SlowMoverGroup],
    pub seasonal: &'a [SeasonalProfit],
}

/// Renders every chart with data into `<out_dir>/charts/` and returns the
/// paths written.
pub fn render_all(inputs: &ChartInputs, out_dir: &Path, target_pct: f64) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join(CHART_DIR);
    std::fs::create_dir_all(&dir)?;
    let mut written = Vec::new();

    if inputs.correlation.samples > 0 {
        let path = dir.join("correlation_heatmap.png");
        correlation_heatmap(inputs.correlation, &path)?;
        written.push(path);
    }
    if !inputs.quarterly.is_empty() {
        let path = dir.join("quarterly_trends.png");
        quarterly_trends(inputs.quarterly, &path)?;
        written.push(path);
    }
    if inputs
        .records
        .iter()
        .any(|t| t.profit_margin.is_some_and(|m| m.is_finite()) && t.discount.is_finite())
    {
        let path = dir.join("discount_vs_margin.png");
        discount_vs_margin(inputs.records, &path)?;
        written.push(path);
    }
    if !inputs.pivot.is_empty() {
        let path = dir.join("profit_by_subcategory.png");
        pivot_heatmap(inputs.pivot, &path)?;
        written.push(path);
    }
    if !inputs.pareto.entries.is_empty() {
        let path = dir.join("pareto_curve.png");
        pareto_curve(inputs.pareto, target_pct, &path)?;
        written.push(path);
    }
    if !inputs.slow_movers.is_empty() {
        let path = dir.join("top_slow_movers.png");
        slow_mover_bars(inputs.slow_movers, &path)?;
        written.push(path);
    }
    if !inputs.seasonal.is_empty() {
        let path = dir.join("seasonal_profit.png");
        seasonal_bars(inputs.seasonal, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn correlation_heatmap(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (900, 760)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation: Inventory Days, Profit, Margin", ("sans-serif", 30))
        .margin(10)
        .build_cartesian_2d(-1.4f64..3.0f64, 0.0f64..3.7f64)?;

    for (i, row) in matrix.values.iter().enumerate() {
        let y0 = 2.0 - i as f64;
        for (j, value) in row.iter().enumerate() {
            let x0 = j as f64;
            if let Some(v) = value {
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                    correlation_color(*v).filled(),
                )))?;
                chart.draw_series(std::iter::once(Text::new(
                    format!("{v:.3}"),
                    (x0 + 0.32, y0 + 0.45),
                    ("sans-serif", 20).into_font(),
                )))?;
            } else {
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                    RGBColor(235, 235, 235).filled(),
                )))?;
                chart.draw_series(std::iter::once(Text::new(
                    "n/a",
                    (x0 + 0.42, y0 + 0.45),
                    ("sans-serif", 20).into_font(),
                )))?;
            }
        }
    }
    for (i, label) in CORRELATION_LABELS.iter().enumerate() {
        // Column headers along the top, row labels down the left side.
        chart.draw_series(std::iter::once(Text::new(
            label.to_string(),
            (i as f64 + 0.12, 3.3),
            ("sans-serif", 18).into_font(),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            label.to_string(),
            (-1.35, 2.45 - i as f64),
            ("sans-serif", 18).into_font(),
        )))?;
    }
    root.present()?;
    Ok(())
}

fn quarterly_trends(trend: &[QuarterSummary], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1280, 960)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(480);

    let labels: Vec<String> = trend.iter().map(|q| q.label()).collect();
    let x_max = (trend.len() as i32 - 1).max(1);

    let sales_max = trend.iter().map(|q| q.sales).fold(f64::MIN, f64::max);
    let mut chart = ChartBuilder::on(&upper)
        .caption("Quarterly Sales Trend", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0..x_max, padded_range(0.0f64.min(sales_max), sales_max))?;
    chart
        .configure_mesh()
        .x_labels(trend.len().min(8))
        .x_label_formatter(&|idx| quarter_label(&labels, *idx))
        .x_desc("Quarter")
        .y_desc("Sales")
        .draw()?;
    chart.draw_series(LineSeries::new(
        trend.iter().enumerate().map(|(i, q)| (i as i32, q.sales)),
        &PALETTE[0],
    ))?;

    let profit_min = trend.iter().map(|q| q.profit).fold(f64::MAX, f64::min);
    let profit_max = trend.iter().map(|q| q.profit).fold(f64::MIN, f64::max);
    let mut chart = ChartBuilder::on(&lower)
        .caption("Quarterly Profit Trend", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0..x_max, padded_range(0.0f64.min(profit_min), profit_max))?;
    chart
        .configure_mesh()
        .x_labels(trend.len().min(8))
        .x_label_formatter(&|idx| quarter_label(&labels, *idx))
        .x_desc("Quarter")
        .y_desc("Profit")
        .draw()?;
    chart.draw_series(LineSeries::new(
        trend.iter().enumerate().map(|(i, q)| (i as i32, q.profit)),
        &PALETTE[3],
    ))?;

    root.present()?;
    Ok(())
}

fn discount_vs_margin(records: &[Transaction], path: &Path) -> Result<()> {
    use std::collections::BTreeMap;

    let mut by_category: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for t in records {
        if let Some(margin) = t.profit_margin {
            if margin.is_finite() && t.discount.is_finite() {
                by_category
                    .entry(t.category.as_str())
                    .or_default()
                    .push((t.discount, margin));
            }
        }
    }
    let points = by_category.values().flatten();
    let (mut x_min, mut x_max) = (f64::MAX, f64::MIN);
    let (mut y_min, mut y_max) = (f64::MAX, f64::MIN);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Discount vs Profit Margin", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded_range(x_min, x_max), padded_range(y_min, y_max))?;
    chart
        .configure_mesh()
        .x_desc("Discount")
        .y_desc("Profit Margin (%)")
        .draw()?;

    for (idx, (category, points)) in by_category.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?
            .label(category.to_string())
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
    }
    chart.configure_series_labels().border_style(&BLACK).draw()?;
    root.present()?;
    Ok(())
}

fn pivot_heatmap(pivot: &ProfitPivot, path: &Path) -> Result<()> {
    let n_cat = pivot.categories.len();
    let n_sub = pivot.sub_categories.len();

    let mut cell_min = f64::MAX;
    let mut cell_max = f64::MIN;
    for category in &pivot.categories {
        for sub in &pivot.sub_categories {
            if let Some(v) = pivot.get(category, sub) {
                cell_min = cell_min.min(v);
                cell_max = cell_max.max(v);
            }
        }
    }

    let root = BitMapBackend::new(path, (1400, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Profit by Category and Sub-Category", ("sans-serif", 30))
        .margin(10)
        .build_cartesian_2d(
            -2.6f64..n_sub as f64,
            -3.4f64..(n_cat as f64 + 0.4),
        )?;

    for (i, category) in pivot.categories.iter().enumerate() {
        let y0 = (n_cat - 1 - i) as f64;
        chart.draw_series(std::iter::once(Text::new(
            category.clone(),
            (-2.55, y0 + 0.4),
            ("sans-serif", 18).into_font(),
        )))?;
        for (j, sub) in pivot.sub_categories.iter().enumerate() {
            let x0 = j as f64;
            let Some(v) = pivot.get(category, sub) else { continue };
            let t = if cell_max > cell_min {
                (v - cell_min) / (cell_max - cell_min)
            } else {
                0.5
            };
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                profit_color(t).filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("{v:.0}"),
                (x0 + 0.15, y0 + 0.45),
                ("sans-serif", 15).into_font(),
            )))?;
        }
    }
    for (j, sub) in pivot.sub_categories.iter().enumerate() {
        chart.draw_series(std::iter::once(Text::new(
            sub.clone(),
            (j as f64 + 0.55, -0.15),
            ("sans-serif", 15)
                .into_font()
                .transform(FontTransform::Rotate90),
        )))?;
    }
    root.present()?;
    Ok(())
}

fn pareto_curve(ranking: &ParetoRanking, target_pct: f64, path: &Path) -> Result<()> {
    let n = ranking.entries.len() as i32;
    let cum_max = ranking
        .entries
        .iter()
        .map(|e| e.cumulative_pct)
        .fold(f64::MIN, f64::max)
        .max(100.0);

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Cumulative Profit Share by Product Rank", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..n, padded_range(0.0, cum_max))?;
    chart
        .configure_mesh()
        .x_desc("Products (ranked by profit)")
        .y_desc("Cumulative Profit (%)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        ranking
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i as i32 + 1, e.cumulative_pct)),
        &PALETTE[0],
    ))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(0, target_pct), (n, target_pct)],
        RED.stroke_width(2),
    )))?;
    root.present()?;
    Ok(())
}

fn slow_mover_bars(movers: &[SlowMoverGroup], path: &Path) -> Result<()> {
    let n = movers.len();
    let days_max = movers
        .iter()
        .map(|m| m.mean_inventory_days)
        .fold(f64::MIN, f64::max)
        .max(1.0);

    let root = BitMapBackend::new(path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Top Slow Movers (Mean Inventory Days)", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(padded_range(0.0, days_max), 0.0f64..n as f64)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Mean Inventory Days")
        .draw()?;

    for (idx, mover) in movers.iter().enumerate() {
        // Slowest group on top.
        let y0 = (n - 1 - idx) as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(0.0, y0 + 0.15), (mover.mean_inventory_days, y0 + 0.85)],
            PALETTE[0].mix(0.7).filled(),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{} ({} / {})", mover.product_name, mover.category, mover.sub_category),
            (days_max * 0.01, y0 + 0.4),
            ("sans-serif", 15).into_font(),
        )))?;
    }
    root.present()?;
    Ok(())
}

fn seasonal_bars(seasonal: &[SeasonalProfit], path: &Path) -> Result<()> {
    use std::collections::BTreeMap;

    let mut categories: Vec<&str> = seasonal.iter().map(|s| s.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();
    let by_key: BTreeMap<(Season, &str), f64> = seasonal
        .iter()
        .map(|s| ((s.season, s.category.as_str()), s.profit))
        .collect();

    let profit_min = seasonal.iter().map(|s| s.profit).fold(f64::MAX, f64::min);
    let profit_max = seasonal.iter().map(|s| s.profit).fold(f64::MIN, f64::max);

    let root = BitMapBackend::new(path, (1100, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Seasonal Profit by Category", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            0.0f64..Season::ALL.len() as f64,
            padded_range(0.0f64.min(profit_min), profit_max),
        )?;
    chart
        .configure_mesh()
        .x_labels(Season::ALL.len())
        .x_label_formatter(&|v| {
            Season::ALL
                .get(*v as usize)
                .map(|s| s.name().to_string())
                .unwrap_or_default()
        })
        .x_desc("Season")
        .y_desc("Profit")
        .draw()?;

    let width = 0.8 / categories.len() as f64;
    for (c_idx, category) in categories.iter().enumerate() {
        let color = PALETTE[c_idx % PALETTE.len()];
        let bars: Vec<Rectangle<(f64, f64)>> = Season::ALL
            .iter()
            .enumerate()
            .filter_map(|(s_idx, season)| {
                by_key.get(&(*season, *category)).map(|profit| {
                    let x0 = s_idx as f64 + 0.1 + c_idx as f64 * width;
                    Rectangle::new([(x0, 0.0), (x0 + width, *profit)], color.filled())
                })
            })
            .collect();
        chart
            .draw_series(bars)?
            .label(category.to_string())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }
    chart.configure_series_labels().border_style(&BLACK).draw()?;
    root.present()?;
    Ok(())
}

fn quarter_label(labels: &[String], idx: i32) -> String {
    usize::try_from(idx)
        .ok()
        .and_then(|i| labels.get(i).cloned())
        .unwrap_or_default()
}

fn padded_range(min: f64, max: f64) -> std::ops::Range<f64> {
    if max > min {
        let pad = (max - min) * 0.05;
        (min - pad)..(max + pad)
    } else {
        (min - 1.0)..(max + 1.0)
    }
}

fn correlation_color(v: f64) -> RGBColor {
    let t = v.clamp(-1.0, 1.0);
    if t >= 0.0 {
        blend((255, 255, 255), (214, 39, 40), t)
    } else {
        blend((255, 255, 255), (31, 119, 180), -t)
    }
}

/// Red through yellow to green over `t` in [0, 1].
fn profit_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        blend((214, 39, 40), (255, 221, 113), t * 2.0)
    } else {
        blend((255, 221, 113), (44, 160, 44), (t - 0.5) * 2.0)
    }
}

fn blend(from: (u8, u8, u8), to: (u8, u8, u8), t: f64) -> RGBColor {
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
