use chrono::Datelike;

use crate::model::{Season, Transaction};

/// Fills in the derived per-record metrics. Order-independent; thresholds
/// and action labels are applied later by the classifier.
pub fn enrich_all(records: &mut [Transaction]) {
    for record in records.iter_mut() {
        enrich_record(record);
    }
}

fn enrich_record(record: &mut Transaction) {
    // Zero sales would divide to +-inf/NaN; those records carry null
    // metrics instead and sit out the distribution statistics.
    if record.sales != 0.0 {
        record.profit_margin = Some(record.profit / record.sales * 100.0);
        record.inventory_days = Some(record.quantity / record.sales * 30.0);
    } else {
        record.profit_margin = None;
        record.inventory_days = None;
    }
    record.season = record.order_date.map(|d| Season::from_month(d.month()));
}
