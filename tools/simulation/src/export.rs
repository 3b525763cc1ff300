//! Report export
//!
//! Serializes the run configuration, metrics and scenario results to JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::metrics::SimMetrics;
use crate::scenarios::ScenarioResult;

/// Combined export containing all simulation outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub config: SimulationConfig,
    pub metrics: SimMetrics,
    pub scenarios: Vec<ScenarioResult>,
}

impl SimulationExport {
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.passed)
    }

    pub fn failed_scenarios(&self) -> Vec<&str> {
        self.scenarios
            .iter()
            .filter(|s| !s.passed)
            .map(|s| s.name.as_str())
            .collect()
    }
}

pub fn build_export(
    config: &SimulationConfig,
    metrics: &SimMetrics,
    scenarios: Vec<ScenarioResult>,
) -> SimulationExport {
    SimulationExport {
        version: crate::VERSION.to_string(),
        config: config.clone(),
        metrics: metrics.clone(),
        scenarios,
    }
}

pub fn export_json(export: &SimulationExport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(export)
}

/// Write export to a file path.
pub fn write_to_file(export: &SimulationExport, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = export_json(export)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_export() {
        let export = build_export(&SimulationConfig::default(), &SimMetrics::new(), Vec::new());
        assert_eq!(export.version, crate::VERSION);
        assert!(export.passed());
    }

    #[test]
    fn test_failed_scenarios_listed() {
        let mut broken = ScenarioResult::new("token_rounds");
        broken.check(false, "round 0 failed");
        let export = build_export(
            &SimulationConfig::default(),
            &SimMetrics::new(),
            vec![ScenarioResult::new("replay_attack"), broken],
        );
        assert!(!export.passed());
        assert_eq!(export.failed_scenarios(), vec!["token_rounds"]);
    }

    #[test]
    fn test_write_to_file_round_trip() {
        let export = build_export(&SimulationConfig::default(), &SimMetrics::new(), Vec::new());
        let path = std::env::temp_dir().join(format!("simulate-report-{}.json", std::process::id()));
        write_to_file(&export, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let parsed: SimulationExport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.version, crate::VERSION);
        assert_eq!(parsed.config, export.config);
    }

    #[test]
    fn test_export_json_shape() {
        let export = build_export(&SimulationConfig::default(), &SimMetrics::new(), Vec::new());
        let json = export_json(&export).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["config"]["siblings"], 2);
        assert_eq!(value["metrics"]["invocations"], 0);
    }
}
