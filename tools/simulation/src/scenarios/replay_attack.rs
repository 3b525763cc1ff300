//! Replay of a consumed nonce, before and after a coordinator restart

use chaincode::ChaincodeError;
use tracing::info;

use super::{args, ScenarioResult};
use crate::metrics::SimMetrics;
use crate::network::SimNetwork;

const REPLAYS: usize = 3;

pub async fn run(net: &mut SimNetwork, metrics: &mut SimMetrics) -> ScenarioResult {
    let mut result = ScenarioResult::new("replay_attack");
    net.coordinator.init(&[]);

    let nonce = match net.coordinator.execute("nonce", &[]).await {
        Ok(outcome) => String::from_utf8_lossy(&outcome.payload).into_owned(),
        Err(e) => {
            result.check(false, format!("nonce query failed: {e}"));
            return result;
        }
    };

    let first = net
        .coordinator
        .execute("set", &args(&["alice", "100", &nonce]))
        .await;
    metrics.record(&first);
    result.invocations += 1;
    result.check(first.is_ok(), format!("first write with nonce {nonce} accepted"));

    let mut rejected = 0;
    for _ in 0..REPLAYS {
        let replay = net
            .coordinator
            .execute("set", &args(&["alice", "999", &nonce]))
            .await;
        metrics.record(&replay);
        result.invocations += 1;
        if matches!(replay, Err(ChaincodeError::DoubleSpend { .. })) {
            rejected += 1;
        }
    }
    result.check(
        rejected == REPLAYS,
        format!("{rejected}/{REPLAYS} replays rejected before restart"),
    );

    if let Err(e) = net.restart_coordinator() {
        result.check(false, format!("coordinator restart failed: {e}"));
        return result;
    }
    let replay = net
        .coordinator
        .execute("set", &args(&["alice", "999", &nonce]))
        .await;
    metrics.record(&replay);
    result.invocations += 1;
    result.check(
        matches!(replay, Err(ChaincodeError::DoubleSpend { .. })),
        "replay rejected after restart",
    );

    result.check(
        net.ledger.raw("alice").as_deref() == Some(b"100".as_slice()),
        "asset keeps the first written value",
    );
    info!(passed = result.passed, "replay_attack finished");
    result
}
