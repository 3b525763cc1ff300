//! Random aggregation across sibling services
//!
//! `add` asks every configured sibling for a random value, keeps the replies
//! that parse as decimal `u64`, and replaces the user's balance with the
//! largest one. Siblings are called concurrently; each call is a detached
//! task awaited for at most `sibling_timeout`, so a slow sibling is excluded
//! without being cancelled.
//!
//! Selection policy: the maximum contribution. Equal values are
//! indistinguishable, so ties cannot change the output; every sibling that
//! produced the maximum is reported as a contributor.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinError;
use tokio::time::{error::Elapsed, timeout};
use tracing::{debug, error, info, warn};
use types::errors::InvokeError;
use types::numeric::parse_u64;
use types::response::PeerResponse;

use crate::balance::BalanceCache;
use crate::config::ChaincodeConfig;
use crate::errors::ChaincodeError;
use crate::events::{BalanceUpdated, ChaincodeEvent};
use crate::ledger::{check_caller_key, LedgerAccessor};
use crate::peer::PeerInvoker;
use crate::random::RandomSource;

/// Function name siblings are invoked with.
pub const RANDOM_FUNCTION: &str = "random";

type SiblingOutcome = Result<Result<Result<PeerResponse, InvokeError>, JoinError>, Elapsed>;

/// What one sibling contributed to an `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    Accepted { service: String, value: u64 },
    Dropped { service: String, reason: String },
}

impl Contribution {
    pub fn service(&self) -> &str {
        match self {
            Contribution::Accepted { service, .. } | Contribution::Dropped { service, .. } => {
                service
            }
        }
    }

    pub fn value(&self) -> Option<u64> {
        match self {
            Contribution::Accepted { value, .. } => Some(*value),
            Contribution::Dropped { .. } => None,
        }
    }
}

/// Largest accepted contribution, or `None` when nothing was accepted.
pub fn select_max(contributions: &[Contribution]) -> Option<u64> {
    contributions.iter().filter_map(Contribution::value).max()
}

/// Outcome of a successful `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub user_id: String,
    pub previous: u64,
    pub selected: u64,
    pub contributions: Vec<Contribution>,
}

impl Aggregation {
    /// Siblings whose value was selected, in configuration order.
    pub fn contributors(&self) -> Vec<String> {
        self.contributions
            .iter()
            .filter(|c| c.value() == Some(self.selected))
            .map(|c| c.service().to_string())
            .collect()
    }

    /// Siblings excluded from the quorum, in configuration order.
    pub fn dropped(&self) -> Vec<String> {
        self.contributions
            .iter()
            .filter(|c| c.value().is_none())
            .map(|c| c.service().to_string())
            .collect()
    }

    pub fn to_event(&self) -> ChaincodeEvent {
        ChaincodeEvent::BalanceUpdated(BalanceUpdated {
            user_id: self.user_id.clone(),
            previous: self.previous,
            balance: self.selected,
            contributors: self.contributors(),
            dropped: self.dropped(),
        })
    }
}

/// Implements the `random` and `add` entry points.
pub struct RandomAggregator {
    ledger: Arc<dyn LedgerAccessor>,
    peers: Arc<dyn PeerInvoker>,
    source: Arc<dyn RandomSource>,
    balances: BalanceCache,
    siblings: Vec<String>,
    channel: String,
    sibling_timeout: Duration,
}

impl RandomAggregator {
    pub fn new(
        config: &ChaincodeConfig,
        ledger: Arc<dyn LedgerAccessor>,
        peers: Arc<dyn PeerInvoker>,
        source: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            ledger,
            peers,
            source,
            balances: BalanceCache::new(),
            siblings: config.siblings.clone(),
            channel: config.channel.clone(),
            sibling_timeout: config.sibling_timeout(),
        }
    }

    /// Draw one local sample. Nothing is persisted.
    pub fn random(&self, user_id: &str) -> u64 {
        let sample = self.source.next_u64();
        debug!(user_id, sample, "random sample drawn");
        sample
    }

    /// Current balance through the cache.
    pub fn balance(&self, user_id: &str) -> Result<u64, ChaincodeError> {
        check_caller_key(user_id)?;
        self.balances.balance(self.ledger.as_ref(), user_id)
    }

    /// Replace `user_id`'s balance with the largest sibling contribution.
    ///
    /// Fails with `QuorumUnavailable` (and writes nothing) when no sibling
    /// produced a usable value, and with `Persistence` when the ledger
    /// rejects the new balance. The reserved nonce key is never a user id.
    pub async fn add(&self, user_id: &str) -> Result<Aggregation, ChaincodeError> {
        let previous = self.balance(user_id)?;
        let contributions = self.collect(user_id).await;

        let Some(selected) = select_max(&contributions) else {
            error!(user_id, attempted = self.siblings.len(), "no usable sibling contribution");
            return Err(ChaincodeError::QuorumUnavailable {
                attempted: self.siblings.len(),
            });
        };

        self.balances
            .store(self.ledger.as_ref(), user_id, selected)?;

        let aggregation = Aggregation {
            user_id: user_id.to_string(),
            previous,
            selected,
            contributions,
        };
        info!(
            user_id,
            previous,
            balance = selected,
            accepted = aggregation.contributions.len() - aggregation.dropped().len(),
            "balance updated"
        );
        Ok(aggregation)
    }

    /// Ask every sibling for a contribution. Never fails as a whole.
    pub async fn collect(&self, user_id: &str) -> Vec<Contribution> {
        let limit = self.sibling_timeout;
        let calls = self.siblings.iter().map(|service| {
            let peers = Arc::clone(&self.peers);
            let target = service.clone();
            let channel = self.channel.clone();
            let args = vec![
                RANDOM_FUNCTION.as_bytes().to_vec(),
                user_id.as_bytes().to_vec(),
            ];
            let task = tokio::spawn(async move { peers.invoke(&target, args, &channel).await });

            let service = service.clone();
            async move {
                let outcome = timeout(limit, task).await;
                Self::classify(service, outcome, limit)
            }
        });
        join_all(calls).await
    }

    fn classify(service: String, outcome: SiblingOutcome, limit: Duration) -> Contribution {
        let reason = match outcome {
            Err(_) => format!("no reply within {}ms", limit.as_millis()),
            Ok(Err(join)) => format!("invocation task failed: {join}"),
            Ok(Ok(Err(transport))) => transport.to_string(),
            Ok(Ok(Ok(reply))) if !reply.is_ok() => {
                format!("status {}: {}", reply.status, reply.message)
            }
            Ok(Ok(Ok(reply))) => match parse_u64(&reply.payload) {
                Ok(value) => {
                    debug!(service = %service, value, "sibling contribution accepted");
                    return Contribution::Accepted { service, value };
                }
                Err(e) => format!("malformed payload: {e}"),
            },
        };
        warn!(service = %service, %reason, "dropping sibling contribution");
        Contribution::Dropped { service, reason }
    }

    /// Forget every cached balance.
    pub fn reset_cache(&self) {
        self.balances.clear();
    }

    pub fn cache(&self) -> &BalanceCache {
        &self.balances
    }
}
