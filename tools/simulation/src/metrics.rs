//! Invocation counters by outcome

use std::collections::BTreeMap;

use chaincode::dispatcher::Outcome;
use chaincode::ChaincodeError;
use serde::{Deserialize, Serialize};

/// Aggregated simulation metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub invocations: u64,
    pub succeeded: u64,
    /// Failures keyed by error kind
    pub failed: BTreeMap<String, u64>,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatched call.
    pub fn record(&mut self, result: &Result<Outcome, ChaincodeError>) {
        self.invocations += 1;
        match result {
            Ok(_) => self.succeeded += 1,
            Err(e) => *self.failed.entry(e.kind().to_string()).or_insert(0) += 1,
        }
    }

    pub fn failures(&self, kind: &str) -> u64 {
        self.failed.get(kind).copied().unwrap_or(0)
    }
}
