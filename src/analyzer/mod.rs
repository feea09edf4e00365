pub mod aggregates;
pub mod classify;

pub use classify::{Classifier, ThresholdClassifier, Thresholds};
