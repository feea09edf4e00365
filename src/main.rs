mod config;
mod model;
mod utils;
mod ingest;
mod enrich;
mod analyzer;
mod report;
mod export;
mod charts;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use analyzer::aggregates::Aggregator;
use analyzer::{Classifier, ThresholdClassifier};
use charts::ChartInputs;
use config::AnalysisConfig;
use enrich::enrich_all;
use ingest::load_transactions_file;
use model::Action;

#[derive(Parser, Debug)]
#[command(
    name = "shelf-sniper",
    version,
    about = "Flags slow-moving and overstocked retail inventory from an order CSV"
)]
struct Cli {
    /// Path to the order export CSV.
    #[arg(long)]
    input: PathBuf,
    /// Directory for the derived CSV exports and charts.
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,
    /// Optional JSON file overriding the analysis defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also render PNG charts under <out-dir>/charts/.
    #[arg(long)]
    charts: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!("🚀 ShelfSniper started");

    let analysis_config = match &cli.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    run(&cli, &analysis_config)
}

/// The whole batch: ingest, enrich, classify in two passes, summarize,
/// print, export, and optionally render charts.
fn run(cli: &Cli, config: &AnalysisConfig) -> anyhow::Result<()> {
    info!("Reading orders from {}...", cli.input.display());
    let ingested = load_transactions_file(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    info!(
        "Rows read: {}, rows used: {}",
        ingested.rows_read, ingested.rows_used
    );
    if ingested.coerced_dates > 0 {
        warn!(
            "{} rows had unparseable order dates (kept with null dates)",
            ingested.coerced_dates
        );
    }
    for row_error in &ingested.row_errors {
        warn!("Skipped line {}: {}", row_error.line, row_error.message);
    }

    let mut dataset = ingested.dataset;

    info!("Deriving metrics...");
    enrich_all(&mut dataset.records);

    info!("Computing thresholds...");
    let classifier = ThresholdClassifier::new(config);
    let thresholds = classifier.compute_thresholds(&dataset.records);
    classifier.apply_labels(&mut dataset.records, &thresholds);

    info!("Summarizing...");
    let correlation = Aggregator::correlation_matrix(&dataset.records);
    let quarterly = Aggregator::quarterly_trend(&dataset.records);
    let pivot = Aggregator::profit_pivot(&dataset.records);
    let pareto = Aggregator::pareto_ranking(&dataset.records);
    let slow_movers = Aggregator::top_slow_movers(&dataset.records, config.top_slow_movers);
    let seasonal = Aggregator::seasonal_profit(&dataset.records);

    report::print_classification(&dataset.records, &thresholds);
    report::print_correlation(&correlation);
    report::print_quarterly(&quarterly);
    report::print_pivot(&pivot);
    report::print_pareto(&pareto, config.pareto_target_pct);
    report::print_slow_movers(&slow_movers);
    report::print_seasonal(&seasonal);

    info!("Writing exports to {}...", cli.out_dir.display());
    let (actionable, full) = export::write_exports(&dataset, &cli.out_dir)?;
    let actionable_rows = dataset
        .records
        .iter()
        .filter(|t| t.action != Action::NoActionNeeded)
        .count();
    info!("Saved {} ({} rows)", actionable.display(), actionable_rows);
    info!("Saved {} ({} rows)", full.display(), dataset.records.len());

    if cli.charts {
        info!("Rendering charts...");
        let inputs = ChartInputs {
            records: &dataset.records,
            correlation: &correlation,
            quarterly: &quarterly,
            pivot: &pivot,
            pareto: &pareto,
            slow_movers: &slow_movers,
            seasonal: &seasonal,
        };
        match charts::render_all(&inputs, &cli.out_dir, config.pareto_target_pct) {
            Ok(paths) => info!("Rendered {} charts", paths.len()),
            Err(e) => warn!("Chart rendering failed: {e:#}"),
        }
    }

    info!("Done.");
    Ok(())
}
