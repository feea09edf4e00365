use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::model::ConfigError;

/// Tunable analysis parameters. Every field has a default matching the
/// standard report, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Inventory-days percentile above which a record is slow-moving.
    pub slow_mover_percentile: f64,
    /// Quantity percentile above which a record is overstocked.
    pub overstock_percentile: f64,
    /// Cumulative profit share the Pareto head must cover, in percent.
    pub pareto_target_pct: f64,
    /// How many slow-mover groups the summary keeps.
    pub top_slow_movers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            slow_mover_percentile: 0.90,
            overstock_percentile: 0.75,
            pareto_target_pct: 80.0,
            top_slow_movers: 10,
        }
    }
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_json::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AnalysisConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("slow_mover_percentile", config.slow_mover_percentile),
        ("overstock_percentile", config.overstock_percentile),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "{name} must be in (0, 1], got {value}"
            )));
        }
    }
    if !(config.pareto_target_pct > 0.0 && config.pareto_target_pct <= 100.0) {
        return Err(ConfigError::Invalid(format!(
            "pareto_target_pct must be in (0, 100], got {}",
            config.pareto_target_pct
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_standard_report() {
        let config = AnalysisConfig::default();
        assert!((config.slow_mover_percentile - 0.90).abs() < 1e-12);
        assert!((config.overstock_percentile - 0.75).abs() < 1e-12);
        assert!((config.pareto_target_pct - 80.0).abs() < 1e-12);
        assert_eq!(config.top_slow_movers, 10);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "slow_mover_percentile": 0.8 }}"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert!((config.slow_mover_percentile - 0.8).abs() < 1e-12);
        assert!((config.overstock_percentile - 0.75).abs() < 1e-12);
        assert_eq!(config.top_slow_movers, 10);
    }

    #[test]
    fn rejects_out_of_range_percentile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "overstock_percentile": 1.5 }}"#).unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
