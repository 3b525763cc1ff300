//! Simulation scenarios
//!
//! Each scenario drives the coordinator through its public entry points and
//! reports whether the observed behaviour held.

pub mod concurrent_writers;
pub mod replay_attack;
pub mod token_rounds;

use chaincode::errors::ConfigError;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::metrics::SimMetrics;
use crate::network::SimNetwork;

/// Result of a single scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub invocations: u64,
    pub passed: bool,
    pub details: Vec<String>,
}

impl ScenarioResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invocations: 0,
            passed: true,
            details: Vec::new(),
        }
    }

    /// Record a check; a failed check fails the scenario.
    pub fn check(&mut self, ok: bool, detail: impl Into<String>) {
        let detail = detail.into();
        if ok {
            self.details.push(detail);
        } else {
            self.passed = false;
            self.details.push(format!("FAILED: {detail}"));
        }
    }
}

/// Run every scenario against a fresh network each.
pub async fn run_all(
    config: &SimulationConfig,
) -> Result<(SimMetrics, Vec<ScenarioResult>), ConfigError> {
    let mut metrics = SimMetrics::new();
    let mut results = Vec::new();

    let mut net = SimNetwork::build(config)?;
    results.push(replay_attack::run(&mut net, &mut metrics).await);

    let net = SimNetwork::build(config)?;
    results.push(concurrent_writers::run(&net, config, &mut metrics).await);

    let net = SimNetwork::build(config)?;
    results.push(token_rounds::run(&net, config, &mut metrics).await);

    Ok((metrics, results))
}

pub(crate) fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
