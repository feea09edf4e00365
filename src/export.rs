//! Derived CSV exports: the actionable shortlist and the full enriched
//! table. Both preserve the insertion order of the processed records and
//! never de-duplicate rows.

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::model::{Action, Dataset, ExportError};

pub const ACTIONABLE_FILE: &str = "actionable_products.csv";
pub const FULL_OUTPUT_FILE: &str = "retail_analysis_output.csv";

const ACTIONABLE_HEADERS: [&str; 6] = [
    "Product_Name",
    "Category",
    "Sub_Category",
    "Inventory_Days",
    "Profit",
    "Action_Recommended",
];

const DERIVED_HEADERS: [&str; 6] = [
    "Profit_Margin",
    "Inventory_Days",
    "Season",
    "Slow_Moving",
    "Overstocked",
    "Action_Recommended",
];

/// Writes both exports into `out_dir`, creating it when missing.
/// Returns the paths of (actionable shortlist, full output).
pub fn write_exports(dataset: &Dataset, out_dir: &Path) -> Result<(PathBuf, PathBuf), ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::CreateDir {
        path: out_dir.display().to_string(),
        source,
    })?;
    let actionable = out_dir.join(ACTIONABLE_FILE);
    write_actionable(dataset, &actionable)?;
    let full = out_dir.join(FULL_OUTPUT_FILE);
    write_full_output(dataset, &full)?;
    Ok((actionable, full))
}

/// Only records whose recommendation calls for an action; fixed column set.
pub fn write_actionable(dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(ACTIONABLE_HEADERS)?;
    for t in dataset
        .records
        .iter()
        .filter(|t| t.action != Action::NoActionNeeded)
    {
        let days = opt_cell(t.inventory_days);
        let profit = t.profit.to_string();
        writer.write_record([
            t.product_name.as_str(),
            t.category.as_str(),
            t.sub_category.as_str(),
            days.as_str(),
            profit.as_str(),
            t.action.label(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Every record: the original cells replayed verbatim, then the six
/// derived columns. Null metrics and seasons become empty cells.
pub fn write_full_output(dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(path)?;
    let mut header = dataset.headers.clone();
    for name in DERIVED_HEADERS {
        header.push_field(name);
    }
    writer.write_record(&header)?;

    for t in &dataset.records {
        let mut row = t.raw.clone();
        row.push_field(&opt_cell(t.profit_margin));
        row.push_field(&opt_cell(t.inventory_days));
        row.push_field(t.season.map_or("", |s| s.name()));
        row.push_field(if t.slow_moving { "true" } else { "false" });
        row.push_field(if t.overstocked { "true" } else { "false" });
        row.push_field(t.action.label());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
