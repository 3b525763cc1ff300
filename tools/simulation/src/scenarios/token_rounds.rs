//! Repeated aggregation rounds with a sibling dropping out halfway

use chaincode::events::ChaincodeEvent;
use tracing::{info, warn};

use super::{args, ScenarioResult};
use crate::config::SimulationConfig;
use crate::metrics::SimMetrics;
use crate::network::SimNetwork;

pub async fn run(
    net: &SimNetwork,
    config: &SimulationConfig,
    metrics: &mut SimMetrics,
) -> ScenarioResult {
    let mut result = ScenarioResult::new("token_rounds");
    net.coordinator.init(&[]);
    let user = config.user_id.as_str();
    let midpoint = config.token_rounds / 2;

    let mut completed = 0;
    let mut degraded = 0;
    for round in 0..config.token_rounds {
        if round == midpoint {
            if let Some(offline) = &config.offline_sibling {
                warn!(sibling = %offline, round, "taking sibling offline");
                net.network.take_offline(offline.clone());
            }
        }

        let outcome = net.coordinator.execute("add", &args(&[user])).await;
        metrics.record(&outcome);
        result.invocations += 1;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                result.check(false, format!("round {round} failed: {e}"));
                continue;
            }
        };

        let selected = String::from_utf8_lossy(&outcome.payload).parse::<u64>().ok();
        if net.ledger.raw_u64(user) != selected {
            result.check(false, format!("round {round} ledger does not hold {selected:?}"));
        }
        if let Some(ChaincodeEvent::BalanceUpdated(update)) = &outcome.event {
            if !update.dropped.is_empty() {
                degraded += 1;
            }
        }
        completed += 1;
    }

    if let Some(offline) = &config.offline_sibling {
        net.network.bring_online(offline);
    }

    result.check(
        completed == config.token_rounds,
        format!("{completed}/{} rounds completed", config.token_rounds),
    );
    result.details.push(format!("{degraded} round(s) ran with a dropped sibling"));
    info!(completed, degraded, passed = result.passed, "token_rounds finished");
    result
}
