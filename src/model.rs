// Core structs: Transaction, Season, Action
use std::fmt;

use chrono::NaiveDate;
use csv::StringRecord;
use thiserror::Error;

/// One order line from the input table, plus the fields derived for it
/// during enrichment and classification.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub order_date: Option<NaiveDate>,
    pub sales: f64,
    pub profit: f64,
    pub quantity: f64,
    pub discount: f64,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    /// Original cells in input column order, replayed verbatim by the
    /// full export so passthrough columns survive untouched.
    pub raw: StringRecord,

    pub profit_margin: Option<f64>,
    pub inventory_days: Option<f64>,
    pub season: Option<Season>,
    pub slow_moving: bool,
    pub overstocked: bool,
    pub action: Action,
}

/// Parsed records together with the input header row.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: StringRecord,
    pub records: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Fall,
    ];

    /// Meteorological grouping: Dec-Feb, Mar-May, Jun-Aug, Sep-Nov.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3 | 4 | 5 => Season::Spring,
            6 | 7 | 8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five recommendation labels. Exactly one is assigned per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PhaseOut,
    BundlePromotions,
    Liquidate,
    RunClearance,
    NoActionNeeded,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::PhaseOut,
        Action::BundlePromotions,
        Action::Liquidate,
        Action::RunClearance,
        Action::NoActionNeeded,
    ];

    /// Wording used in the exports; kept stable for downstream filters.
    pub fn label(&self) -> &'static str {
        match self {
            Action::PhaseOut => "Phase Out (with Discounting)",
            Action::BundlePromotions => "Bundle Promotions",
            Action::Liquidate => "Liquidate Inventory",
            Action::RunClearance => "Run Clearance Promotions",
            Action::NoActionNeeded => "No Action Needed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open input file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create output directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_grouping_covers_every_month() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Fall);
        assert_eq!(Season::from_month(11), Season::Fall);
    }

    #[test]
    fn action_labels_match_export_wording() {
        assert_eq!(Action::PhaseOut.label(), "Phase Out (with Discounting)");
        assert_eq!(Action::BundlePromotions.label(), "Bundle Promotions");
        assert_eq!(Action::Liquidate.label(), "Liquidate Inventory");
        assert_eq!(Action::RunClearance.label(), "Run Clearance Promotions");
        assert_eq!(Action::NoActionNeeded.label(), "No Action Needed");
    }
}
