//! Many writers racing on the same nonce

use chaincode::ChaincodeError;
use futures::future::join_all;
use tracing::info;

use super::{args, ScenarioResult};
use crate::config::SimulationConfig;
use crate::metrics::SimMetrics;
use crate::network::SimNetwork;

pub async fn run(
    net: &SimNetwork,
    config: &SimulationConfig,
    metrics: &mut SimMetrics,
) -> ScenarioResult {
    let mut result = ScenarioResult::new("concurrent_writers");
    net.coordinator.init(&[]);

    let nonce = match net.coordinator.assets().nonce() {
        Ok(nonce) => nonce.to_string(),
        Err(e) => {
            result.check(false, format!("nonce query failed: {e}"));
            return result;
        }
    };

    let tasks = (0..config.concurrent_writers).map(|writer| {
        let coordinator = net.coordinator.clone();
        let call = args(&["shared", &writer.to_string(), &nonce]);
        tokio::spawn(async move { coordinator.execute("set", &call).await })
    });

    let mut wins = 0;
    let mut double_spends = 0;
    for joined in join_all(tasks).await {
        match joined {
            Ok(outcome) => {
                metrics.record(&outcome);
                result.invocations += 1;
                match outcome {
                    Ok(_) => wins += 1,
                    Err(ChaincodeError::DoubleSpend { .. }) => double_spends += 1,
                    Err(_) => {}
                }
            }
            Err(e) => result.check(false, format!("writer task panicked: {e}")),
        }
    }

    result.check(wins == 1, format!("{wins} writer(s) won nonce {nonce}"));
    result.check(
        double_spends == config.concurrent_writers - 1,
        format!("{double_spends} writer(s) rejected as double spends"),
    );
    let expected = nonce.parse::<u64>().map(|n| n + 1).ok();
    result.check(
        net.ledger.raw_u64(chaincode::NONCE_KEY) == expected,
        "persisted nonce advanced exactly once",
    );
    info!(wins, double_spends, passed = result.passed, "concurrent_writers finished");
    result
}
