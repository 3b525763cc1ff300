//! Types library for the asset chaincode
//!
//! Value types exchanged between the chaincode and its ledger-runtime host:
//! responses, peer replies, host-level errors, invocation identifiers and the
//! decimal encoding used for every numeric value stored on the ledger.
//!
//! # Modules
//! - `ids`: Invocation identifiers
//! - `numeric`: Decimal text codec for `u64` ledger values
//! - `response`: Host response shape, peer replies, event records
//! - `errors`: Host error taxonomy and error kinds

pub mod errors;
pub mod ids;
pub mod numeric;
pub mod response;
