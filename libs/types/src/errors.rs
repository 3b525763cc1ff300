//! Host error taxonomy
//!
//! Errors raised by the ledger-runtime host (ledger access, peer invocation)
//! and the coarse `ErrorKind` classification every chaincode error maps to.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure of a ledger read or write
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("ledger rejected key {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// Transport failure while invoking a sibling chaincode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("chaincode {service} is not installed on channel {channel}")]
    UnknownService { service: String, channel: String },

    #[error("chaincode {service} unreachable: {reason}")]
    Unreachable { service: String, reason: String },
}

/// Decoding failure for a decimal ledger value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("value is not valid UTF-8")]
    NotUtf8,

    #[error("not an unsigned decimal: {value:?}")]
    NotDecimal { value: String },

    #[error("decimal out of u64 range: {value}")]
    OutOfRange { value: String },
}

/// Coarse failure classes reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Read of an absent key
    NotFound,
    /// Nonce already consumed or out of order. Never retried.
    DoubleSpend,
    /// Ledger write failed. Retry the whole operation from scratch.
    PersistenceError,
    /// Ledger read failed or returned unusable data
    AccessError,
    /// No sibling produced a usable contribution
    QuorumUnavailable,
    /// Wrong function, argument count or argument format
    MalformedArgument,
}

impl ErrorKind {
    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::PersistenceError | ErrorKind::AccessError | ErrorKind::QuorumUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::DoubleSpend => "DoubleSpend",
            ErrorKind::PersistenceError => "PersistenceError",
            ErrorKind::AccessError => "AccessError",
            ErrorKind::QuorumUnavailable => "QuorumUnavailable",
            ErrorKind::MalformedArgument => "MalformedArgument",
        };
        f.write_str(name)
    }
}
