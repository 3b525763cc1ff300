//! Chaincode error types
//!
//! Every failure an entry point can report. Each variant maps onto one
//! `ErrorKind`; the dispatcher renders the display text into the error
//! response so the original message reaches the caller unchanged.

use thiserror::Error;
use types::errors::{ErrorKind, LedgerError, NumericError};

/// Failure of a chaincode operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChaincodeError {
    #[error("Asset not found: {key}")]
    NotFound { key: String },

    #[error("double spent: nonce {supplied} presented, expected {current}")]
    DoubleSpend { supplied: u64, current: u64 },

    #[error("double spent: ledger nonce {persisted} is ahead of local nonce {current}")]
    LedgerAhead { persisted: u64, current: u64 },

    #[error("nonce space exhausted at {current}")]
    NonceExhausted { current: u64 },

    #[error("Failed to set asset: {key}: {source}")]
    Persistence { key: String, source: LedgerError },

    #[error("Partial write: {written} persisted but {failed} failed: {source}")]
    PartialWrite {
        written: String,
        failed: String,
        source: LedgerError,
    },

    #[error("Failed to get asset: {key} with error: {source}")]
    Access { key: String, source: LedgerError },

    #[error("Corrupt value stored under {key}: {source}")]
    CorruptValue { key: String, source: NumericError },

    #[error("No usable random contribution: {attempted} sibling(s) invoked")]
    QuorumUnavailable { attempted: usize },

    #[error("Incorrect arguments. {0}")]
    MalformedArgument(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),
}

impl ChaincodeError {
    /// Coarse classification reported alongside the message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChaincodeError::NotFound { .. } => ErrorKind::NotFound,
            ChaincodeError::DoubleSpend { .. }
            | ChaincodeError::LedgerAhead { .. }
            | ChaincodeError::NonceExhausted { .. } => ErrorKind::DoubleSpend,
            ChaincodeError::Persistence { .. } | ChaincodeError::PartialWrite { .. } => {
                ErrorKind::PersistenceError
            }
            ChaincodeError::Access { .. } | ChaincodeError::CorruptValue { .. } => {
                ErrorKind::AccessError
            }
            ChaincodeError::QuorumUnavailable { .. } => ErrorKind::QuorumUnavailable,
            ChaincodeError::MalformedArgument(_) | ChaincodeError::UnknownFunction(_) => {
                ErrorKind::MalformedArgument
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(String),

    #[error("No sibling services configured")]
    NoSiblings,

    #[error("Duplicate sibling service: {0}")]
    DuplicateSibling(String),

    #[error("Service {0} cannot list itself as a sibling")]
    SelfSibling(String),

    #[error("Sibling timeout must be positive")]
    ZeroTimeout,
}
