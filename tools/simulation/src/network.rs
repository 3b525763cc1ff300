//! Coordinator and siblings wired over a local network

use std::sync::Arc;

use chaincode::memory::{LocalNetwork, MemoryLedger, ScriptedPeers};
use chaincode::random::{RandomSource, SequenceSource, TimeSeededSource};
use chaincode::errors::ConfigError;
use chaincode::{Chaincode, ChaincodeConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::SimulationConfig;

/// Name the coordinator is installed under.
pub const COORDINATOR: &str = "addc";

/// Draws pre-generated per seeded sibling.
const SEEDED_DRAWS: usize = 256;

/// A coordinator chaincode plus its siblings, one ledger each.
pub struct SimNetwork {
    pub network: Arc<LocalNetwork>,
    pub coordinator: Arc<Chaincode>,
    pub ledger: Arc<MemoryLedger>,
    coordinator_config: ChaincodeConfig,
}

impl SimNetwork {
    pub fn build(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let network = Arc::new(LocalNetwork::new(config.channel.clone()));
        let sibling_names = config.sibling_names();

        for (index, name) in sibling_names.iter().enumerate() {
            let sibling_config = ChaincodeConfig {
                service_name: name.clone(),
                siblings: vec![COORDINATOR.to_string()],
                channel: config.channel.clone(),
                sibling_timeout_ms: config.sibling_timeout_ms,
                lenient_dispatch: false,
            };
            let sibling = Chaincode::new(
                sibling_config,
                Arc::new(MemoryLedger::new()),
                Arc::new(ScriptedPeers::new()),
                sibling_source(config.seed, index as u64),
            )?;
            network.install(name.clone(), Arc::new(sibling));
        }

        let coordinator_config = ChaincodeConfig {
            service_name: COORDINATOR.to_string(),
            siblings: sibling_names,
            channel: config.channel.clone(),
            sibling_timeout_ms: config.sibling_timeout_ms,
            lenient_dispatch: false,
        };
        let ledger = Arc::new(MemoryLedger::new());
        let coordinator = Arc::new(Self::coordinator(&coordinator_config, &ledger, &network)?);
        info!(siblings = config.siblings, seed = ?config.seed, "simulation network built");

        Ok(Self {
            network,
            coordinator,
            ledger,
            coordinator_config,
        })
    }

    /// Replace the coordinator with a fresh process over the same ledger.
    pub fn restart_coordinator(&mut self) -> Result<(), ConfigError> {
        self.coordinator = Arc::new(Self::coordinator(
            &self.coordinator_config,
            &self.ledger,
            &self.network,
        )?);
        info!("coordinator restarted");
        Ok(())
    }

    fn coordinator(
        config: &ChaincodeConfig,
        ledger: &Arc<MemoryLedger>,
        network: &Arc<LocalNetwork>,
    ) -> Result<Chaincode, ConfigError> {
        Chaincode::new(
            config.clone(),
            ledger.clone(),
            network.clone(),
            Arc::new(TimeSeededSource),
        )
    }
}

fn sibling_source(seed: Option<u64>, index: u64) -> Arc<dyn RandomSource> {
    match seed {
        Some(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index));
            let draws = (0..SEEDED_DRAWS).map(|_| rng.gen::<u64>()).collect();
            Arc::new(SequenceSource::new(draws))
        }
        None => Arc::new(TimeSeededSource),
    }
}
