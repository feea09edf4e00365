use crate::config::AnalysisConfig;
use crate::model::{Action, Transaction};

/// Distribution cutoffs collected in the first pass over the batch.
/// A side is `None` when its column has no usable values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub slow_inventory_days: Option<f64>,
    pub overstock_quantity: Option<f64>,
}

/// Trait defining the interface for the two-pass record classifier.
pub trait Classifier {
    /// First pass: collect percentile cutoffs over the whole batch.
    fn compute_thresholds(&self, records: &[Transaction]) -> Thresholds;
    /// Second pass: flag and label every record against fixed cutoffs.
    /// Stateless per record, so the outcome never depends on record order.
    fn apply_labels(&self, records: &mut [Transaction], thresholds: &Thresholds);
}

/// Percentile-based classifier implementation.
pub struct ThresholdClassifier {
    slow_mover_percentile: f64,
    overstock_percentile: f64,
}

impl ThresholdClassifier {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            slow_mover_percentile: config.slow_mover_percentile,
            overstock_percentile: config.overstock_percentile,
        }
    }
}

impl Classifier for ThresholdClassifier {
    /// The slow-mover cutoff ranges over records whose inventory days are
    /// defined; the overstock cutoff ranges over every record's quantity.
    fn compute_thresholds(&self, records: &[Transaction]) -> Thresholds {
        let days: Vec<f64> = records
            .iter()
            .filter_map(|t| t.inventory_days)
            .filter(|d| d.is_finite())
            .collect();
        let quantities: Vec<f64> = records
            .iter()
            .map(|t| t.quantity)
            .filter(|q| q.is_finite())
            .collect();
        Thresholds {
            slow_inventory_days: percentile(&days, self.slow_mover_percentile),
            overstock_quantity: percentile(&quantities, self.overstock_percentile),
        }
    }

    fn apply_labels(&self, records: &mut [Transaction], thresholds: &Thresholds) {
        for record in records.iter_mut() {
            record.slow_moving = match (record.inventory_days, thresholds.slow_inventory_days) {
                (Some(days), Some(cutoff)) => days > cutoff,
                _ => false,
            };
            record.overstocked = thresholds
                .overstock_quantity
                .is_some_and(|cutoff| record.quantity > cutoff);
            record.action = action_for(record.slow_moving, record.overstocked, record.profit);
        }
    }
}

/// Ordered decision table; the first matching rule wins, so slow-moving
/// rules shadow overstock rules when both flags are set.
pub fn action_for(slow_moving: bool, overstocked: bool, profit: f64) -> Action {
    if slow_moving && profit < 0.0 {
        Action::PhaseOut
    } else if slow_moving {
        Action::BundlePromotions
    } else if overstocked && profit < 0.0 {
        Action::Liquidate
    } else if overstocked {
        Action::RunClearance
    } else {
        Action::NoActionNeeded
    }
}

/// Percentile with linear interpolation between closest ranks.
/// `q` is in (0, 1].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(quantity: f64, profit: f64, inventory_days: Option<f64>) -> Transaction {
        Transaction {
            order_date: None,
            sales: 100.0,
            profit,
            quantity,
            discount: 0.0,
            category: "Furniture".to_string(),
            sub_category: "Chairs".to_string(),
            product_name: "Chair".to_string(),
            raw: csv::StringRecord::new(),
            profit_margin: Some(profit),
            inventory_days,
            season: None,
            slow_moving: false,
            overstocked: false,
            action: Action::NoActionNeeded,
        }
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // rank 0.75 * 3 = 2.25 -> 3 + 0.25 * (4 - 3)
        assert!((percentile(&values, 0.75).unwrap() - 3.25).abs() < 1e-9);
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        // rank 0.9 * 9 = 8.1 -> 9 + 0.1 * (10 - 9)
        assert!((percentile(&values, 0.9).unwrap() - 9.1).abs() < 1e-9);
    }

    #[test]
    fn percentile_handles_tiny_inputs() {
        assert_eq!(percentile(&[], 0.9), None);
        assert!((percentile(&[7.5], 0.9).unwrap() - 7.5).abs() < 1e-9);
        assert!((percentile(&[3.0, 1.0], 1.0).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn thresholds_skip_undefined_inventory_days_but_count_every_quantity() {
        let records = vec![
            txn(1.0, 1.0, Some(10.0)),
            txn(2.0, 1.0, Some(20.0)),
            txn(3.0, 1.0, Some(30.0)),
            // Zero-sales style record: no inventory days, quantity still counts.
            txn(100.0, 1.0, None),
        ];
        let classifier = ThresholdClassifier::new(&AnalysisConfig::default());
        let thresholds = classifier.compute_thresholds(&records);
        // p90 over [10, 20, 30]: rank 1.8 -> 20 + 0.8 * 10 = 28.
        assert!((thresholds.slow_inventory_days.unwrap() - 28.0).abs() < 1e-9);
        // p75 over [1, 2, 3, 100]: rank 2.25 -> 3 + 0.25 * 97 = 27.25.
        assert!((thresholds.overstock_quantity.unwrap() - 27.25).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_yields_no_thresholds() {
        let classifier = ThresholdClassifier::new(&AnalysisConfig::default());
        let thresholds = classifier.compute_thresholds(&[]);
        assert_eq!(thresholds.slow_inventory_days, None);
        assert_eq!(thresholds.overstock_quantity, None);
    }

    #[test]
    fn decision_table_covers_all_five_labels() {
        assert_eq!(action_for(true, false, -5.0), Action::PhaseOut);
        assert_eq!(action_for(true, false, 5.0), Action::BundlePromotions);
        assert_eq!(action_for(false, true, -5.0), Action::Liquidate);
        assert_eq!(action_for(false, true, 10.0), Action::RunClearance);
        assert_eq!(action_for(false, false, -5.0), Action::NoActionNeeded);
        assert_eq!(action_for(false, false, 5.0), Action::NoActionNeeded);
    }

    #[test]
    fn slow_moving_rules_shadow_overstock_rules() {
        assert_eq!(action_for(true, true, -5.0), Action::PhaseOut);
        assert_eq!(action_for(true, true, 5.0), Action::BundlePromotions);
    }

    #[test]
    fn boundary_profit_counts_as_non_negative() {
        assert_eq!(action_for(true, false, 0.0), Action::BundlePromotions);
        assert_eq!(action_for(false, true, 0.0), Action::RunClearance);
    }

    #[test]
    fn labels_flags_and_cutoffs_are_strict() {
        let thresholds = Thresholds {
            slow_inventory_days: Some(28.0),
            overstock_quantity: Some(5.0),
        };
        let mut records = vec![
            txn(5.0, 10.0, Some(28.0)), // exactly at both cutoffs
            txn(6.0, 10.0, Some(29.0)), // above both
            txn(6.0, -1.0, None),       // undefined days, above quantity
        ];
        let classifier = ThresholdClassifier::new(&AnalysisConfig::default());
        classifier.apply_labels(&mut records, &thresholds);

        assert!(!records[0].slow_moving);
        assert!(!records[0].overstocked);
        assert_eq!(records[0].action, Action::NoActionNeeded);

        assert!(records[1].slow_moving);
        assert!(records[1].overstocked);
        assert_eq!(records[1].action, Action::BundlePromotions);

        assert!(!records[2].slow_moving, "undefined inventory days never flags");
        assert!(records[2].overstocked);
        assert_eq!(records[2].action, Action::Liquidate);
    }

    #[test]
    fn absent_thresholds_label_everything_no_action() {
        let thresholds = Thresholds {
            slow_inventory_days: None,
            overstock_quantity: None,
        };
        let mut records = vec![txn(1000.0, -50.0, Some(1000.0))];
        let classifier = ThresholdClassifier::new(&AnalysisConfig::default());
        classifier.apply_labels(&mut records, &thresholds);
        assert_eq!(records[0].action, Action::NoActionNeeded);
    }
}
