//! Chaincode configuration
//!
//! The reference deployment is a coordinator that aggregates two sibling
//! services, `addc1` and `addc2`, on `mychannel`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::errors::ConfigError;

/// Configuration for one chaincode instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaincodeConfig {
    /// Name this instance is installed under. Used in log spans.
    pub service_name: String,
    /// Sibling services asked for a random contribution on `add`.
    pub siblings: Vec<String>,
    /// Channel sibling invocations are sent on.
    pub channel: String,
    /// Bounded wait for each sibling call, in milliseconds.
    pub sibling_timeout_ms: u64,
    /// Treat unknown function names as `get` instead of rejecting them.
    pub lenient_dispatch: bool,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            service_name: "addc".to_string(),
            siblings: vec!["addc1".to_string(), "addc2".to_string()],
            channel: "mychannel".to_string(),
            sibling_timeout_ms: 3_000,
            lenient_dispatch: false,
        }
    }
}

impl ChaincodeConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.siblings.is_empty() {
            return Err(ConfigError::NoSiblings);
        }
        if self.sibling_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let mut seen = HashSet::new();
        for sibling in &self.siblings {
            if sibling == &self.service_name {
                return Err(ConfigError::SelfSibling(sibling.clone()));
            }
            if !seen.insert(sibling.as_str()) {
                return Err(ConfigError::DuplicateSibling(sibling.clone()));
            }
        }
        Ok(())
    }

    pub fn sibling_timeout(&self) -> Duration {
        Duration::from_millis(self.sibling_timeout_ms)
    }
}
