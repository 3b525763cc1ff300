//! Simulation configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading a simulation configuration.
#[derive(Debug, Error)]
pub enum SimConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid simulation config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid simulation config: {0}")]
    Invalid(String),
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of sibling services (`addc1`..`addcN`).
    pub siblings: usize,
    /// Channel every service is installed on.
    pub channel: String,
    /// Bounded wait per sibling call, in milliseconds.
    pub sibling_timeout_ms: u64,
    /// Seed for sibling draws. `None` uses wall-clock seeded draws.
    pub seed: Option<u64>,
    /// Writers racing on one captured nonce.
    pub concurrent_writers: usize,
    /// `add` rounds in the token scenario.
    pub token_rounds: usize,
    /// Sibling taken offline halfway through the token rounds.
    pub offline_sibling: Option<String>,
    /// User whose balance the token scenario updates.
    pub user_id: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            siblings: 2,
            channel: "mychannel".to_string(),
            sibling_timeout_ms: 3_000,
            seed: Some(7),
            concurrent_writers: 16,
            token_rounds: 10,
            offline_sibling: Some("addc2".to_string()),
            user_id: "alice".to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, SimConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SimConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.siblings == 0 {
            return Err(SimConfigError::Invalid("at least one sibling required".into()));
        }
        if self.sibling_timeout_ms == 0 {
            return Err(SimConfigError::Invalid("sibling timeout must be positive".into()));
        }
        if self.concurrent_writers == 0 {
            return Err(SimConfigError::Invalid("at least one writer required".into()));
        }
        if let Some(name) = &self.offline_sibling {
            if !self.sibling_names().contains(name) {
                return Err(SimConfigError::Invalid(format!("unknown sibling {name}")));
            }
        }
        Ok(())
    }

    /// Installed sibling names, `addc1` first.
    pub fn sibling_names(&self) -> Vec<String> {
        (1..=self.siblings).map(|i| format!("addc{i}")).collect()
    }
}
