//! Request dispatch: the chaincode entry points
//!
//! `Chaincode::invoke` maps a function name and its string arguments onto the
//! asset store or the random aggregator and renders the outcome as a host
//! `Response`. Failures never produce a payload; the error's display text is
//! carried in the response message.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument, Span};
use types::ids::InvocationId;
use types::response::Response;

use crate::aggregator::RandomAggregator;
use crate::asset_store::AssetStore;
use crate::config::ChaincodeConfig;
use crate::errors::{ChaincodeError, ConfigError};
use crate::events::{AssetWritten, ChaincodeEvent, NonceInitialized};
use crate::ledger::LedgerAccessor;
use crate::peer::PeerInvoker;
use crate::random::RandomSource;

/// Functions the chaincode answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Get,
    Set,
    Add,
    Random,
    Nonce,
    Balance,
}

impl Function {
    pub const ALL: [Function; 6] = [
        Function::Get,
        Function::Set,
        Function::Add,
        Function::Random,
        Function::Nonce,
        Function::Balance,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Get => "get",
            Function::Set => "set",
            Function::Add => "add",
            Function::Random => "random",
            Function::Nonce => "nonce",
            Function::Balance => "balance",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful result of one dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub payload: Vec<u8>,
    pub event: Option<ChaincodeEvent>,
}

impl Outcome {
    fn payload(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            event: None,
        }
    }

    fn with_event(mut self, event: ChaincodeEvent) -> Self {
        self.event = Some(event);
        self
    }

    fn into_response(self) -> Response {
        let response = Response::success(self.payload);
        match self.event.as_ref().map(ChaincodeEvent::to_record) {
            Some(Ok(record)) => response.with_event(record),
            Some(Err(e)) => {
                error!(error = %e, "event serialization failed");
                response
            }
            None => response,
        }
    }
}

/// A chaincode instance: asset store, random aggregator, and the dispatch
/// table in front of them.
pub struct Chaincode {
    config: ChaincodeConfig,
    assets: AssetStore,
    aggregator: RandomAggregator,
    span: Span,
}

impl Chaincode {
    /// Build an instance over the host's ledger and peers. The configuration
    /// is validated here so a zero timeout or an empty sibling list never
    /// reaches the aggregator.
    pub fn new(
        config: ChaincodeConfig,
        ledger: Arc<dyn LedgerAccessor>,
        peers: Arc<dyn PeerInvoker>,
        source: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let span = info_span!("chaincode", service = %config.service_name);
        let aggregator = RandomAggregator::new(&config, Arc::clone(&ledger), peers, source);
        Ok(Self {
            assets: AssetStore::new(ledger),
            aggregator,
            config,
            span,
        })
    }

    pub fn config(&self) -> &ChaincodeConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn aggregator(&self) -> &RandomAggregator {
        &self.aggregator
    }

    /// Deployment/upgrade entry point. Arguments are ignored.
    ///
    /// Hydrates the nonce guard, creates the reserved nonce key if it is
    /// missing and drops cached balances. Other keys are left untouched, so
    /// calling it again is harmless.
    pub fn init(&self, _args: &[String]) -> Response {
        let _entered = self.span.enter();
        match self.assets.initialize() {
            Ok(init) => {
                self.aggregator.reset_cache();
                info!(nonce = init.nonce, created = init.created, "chaincode initialized");
                Outcome::payload(Vec::new())
                    .with_event(ChaincodeEvent::NonceInitialized(NonceInitialized {
                        nonce: init.nonce,
                        created: init.created,
                    }))
                    .into_response()
            }
            Err(e) => {
                error!(error = %e, "init failed");
                Response::error(e.to_string())
            }
        }
    }

    /// Per-transaction entry point.
    pub async fn invoke(&self, function: &str, args: &[String]) -> Response {
        let span = info_span!(
            parent: &self.span,
            "invoke",
            function,
            invocation = %InvocationId::new()
        );
        async {
            match self.execute(function, args).await {
                Ok(outcome) => outcome.into_response(),
                Err(e) => {
                    if e.is_retryable() {
                        error!(kind = %e.kind(), error = %e, "invocation failed");
                    } else {
                        warn!(kind = %e.kind(), error = %e, "invocation rejected");
                    }
                    Response::error(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Dispatch without rendering, for callers that want the typed error.
    pub async fn execute(&self, function: &str, args: &[String]) -> Result<Outcome, ChaincodeError> {
        let function = match Function::parse(function) {
            Some(f) => f,
            None if self.config.lenient_dispatch => {
                warn!(function, "unknown function treated as get");
                Function::Get
            }
            None => return Err(ChaincodeError::UnknownFunction(function.to_string())),
        };

        match function {
            Function::Get => {
                let [key] = expect_args(args, "Expecting a key")?;
                Ok(Outcome::payload(self.assets.get(key)?))
            }
            Function::Set => {
                let (key, value, supplied) = match args {
                    [key, value] => (key, value, None),
                    [key, value, nonce] => (key, value, Some(parse_nonce(nonce)?)),
                    _ => {
                        return Err(ChaincodeError::MalformedArgument(
                            "Expecting a key and a value".to_string(),
                        ))
                    }
                };
                let written = self.assets.set(key, value.as_bytes(), supplied);
                // Balances live in the same key space; the ledger may now
                // hold a value the cache has not seen.
                self.aggregator.cache().evict(key);
                let receipt = written?;
                let event = ChaincodeEvent::AssetWritten(AssetWritten {
                    key: receipt.key,
                    nonce: receipt.nonce,
                });
                Ok(Outcome::payload(receipt.value).with_event(event))
            }
            Function::Add => {
                let [user_id] = expect_args(args, "Expecting a user id")?;
                let aggregation = self.aggregator.add(user_id).await?;
                Ok(Outcome::payload(aggregation.selected.to_string())
                    .with_event(aggregation.to_event()))
            }
            Function::Random => {
                let [user_id] = expect_args(args, "Expecting a user id")?;
                Ok(Outcome::payload(self.aggregator.random(user_id).to_string()))
            }
            Function::Nonce => {
                let [] = expect_args(args, "Expecting no arguments")?;
                Ok(Outcome::payload(self.assets.nonce()?.to_string()))
            }
            Function::Balance => {
                let [user_id] = expect_args(args, "Expecting a user id")?;
                Ok(Outcome::payload(self.aggregator.balance(user_id)?.to_string()))
            }
        }
    }
}

fn expect_args<'a, const N: usize>(
    args: &'a [String],
    expecting: &str,
) -> Result<[&'a str; N], ChaincodeError> {
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    <[&str; N]>::try_from(refs)
        .map_err(|_| ChaincodeError::MalformedArgument(expecting.to_string()))
}

fn parse_nonce(raw: &str) -> Result<u64, ChaincodeError> {
    types::numeric::parse_u64(raw.as_bytes())
        .map_err(|e| ChaincodeError::MalformedArgument(format!("Invalid nonce {raw:?}: {e}")))
}
