//! Ledger access
//!
//! The ledger is owned by the host runtime. The chaincode sees it only
//! through `LedgerAccessor`: a synchronous get/put over string keys.

use types::errors::LedgerError;
use types::numeric::decode_u64;

use crate::errors::ChaincodeError;

/// Reserved key holding the persisted nonce (decimal text).
pub const NONCE_KEY: &str = "nonce";

/// Read/write access to the host ledger.
///
/// `get` returns `Ok(None)` for an absent key. Hosts that report absence as
/// an empty value are treated the same way by every reader in this crate.
pub trait LedgerAccessor: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    fn put(&self, key: &str, value: &[u8]) -> Result<(), LedgerError>;
}

/// Reject keys a caller may not write through any entry point: the empty
/// key and `NONCE_KEY`. Balances share the asset namespace, so this applies
/// to user ids as well as asset keys.
pub(crate) fn check_caller_key(key: &str) -> Result<(), ChaincodeError> {
    if key.is_empty() {
        return Err(ChaincodeError::MalformedArgument(
            "Expecting a non-empty key".to_string(),
        ));
    }
    if key == NONCE_KEY {
        return Err(ChaincodeError::MalformedArgument(format!(
            "Key {NONCE_KEY} is reserved"
        )));
    }
    Ok(())
}

/// Read raw bytes, folding empty values into `None`.
pub(crate) fn read_bytes(
    ledger: &dyn LedgerAccessor,
    key: &str,
) -> Result<Option<Vec<u8>>, ChaincodeError> {
    let value = ledger.get(key).map_err(|source| ChaincodeError::Access {
        key: key.to_string(),
        source,
    })?;
    Ok(value.filter(|bytes| !bytes.is_empty()))
}

/// Read a decimal `u64`. Absent keys read as `None`.
pub(crate) fn read_u64(
    ledger: &dyn LedgerAccessor,
    key: &str,
) -> Result<Option<u64>, ChaincodeError> {
    let raw = read_bytes(ledger, key)?;
    decode_u64(raw.as_deref()).map_err(|source| ChaincodeError::CorruptValue {
        key: key.to_string(),
        source,
    })
}
