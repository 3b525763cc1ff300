//! Asset Chaincode: nonce-guarded asset store and sibling randomness
//!
//! Logic hosted by a ledger runtime. The runtime owns durable storage and
//! peer-to-peer invocation; this crate only sees them through the
//! `LedgerAccessor` and `PeerInvoker` traits.
//!
//! # Modules
//! - `errors`: Chaincode error taxonomy
//! - `events`: Events attached to successful mutating transactions
//! - `config`: Instance configuration (siblings, channel, timeouts)
//! - `ledger`: Ledger access trait and the reserved nonce key
//! - `peer`: Sibling invocation trait
//! - `nonce`: Ledger-hydrated nonce guard (double-spend prevention)
//! - `asset_store`: Guarded get/set over the ledger
//! - `random`: Injectable random sources
//! - `balance`: Read-through token balance cache
//! - `aggregator`: `random` and `add` (fan-out, collect, select maximum)
//! - `dispatcher`: `init`/`invoke` entry points
//! - `memory`: In-memory ledger and peer invokers for tests and simulation

pub mod aggregator;
pub mod asset_store;
pub mod balance;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod nonce;
pub mod peer;
pub mod random;

pub use config::ChaincodeConfig;
pub use dispatcher::Chaincode;
pub use errors::ChaincodeError;
pub use ledger::{LedgerAccessor, NONCE_KEY};
pub use peer::PeerInvoker;
pub use random::RandomSource;
