//! Local simulation of the asset chaincode
//!
//! Runs a coordinator chaincode and its sibling services in one process,
//! each over its own in-memory ledger, connected through a local network.
//! Scenarios drive the coordinator the way concurrent clients would and
//! report what the protocols let through.
//!
//! # Modules
//! - `config`: Simulation configuration
//! - `network`: Coordinator + siblings wired over a `LocalNetwork`
//! - `metrics`: Invocation counters by outcome
//! - `scenarios`: Replay attack, concurrent writers, token rounds
//! - `export`: JSON export of the simulation report

pub mod config;
pub mod export;
pub mod metrics;
pub mod network;
pub mod scenarios;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
