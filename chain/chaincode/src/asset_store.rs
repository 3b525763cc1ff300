//! Asset store: nonce-guarded key/value writes over the host ledger
//!
//! - `get` reads a caller key; absent and empty values are `NotFound`
//! - `set` writes a caller key and then the advanced nonce, both through
//!   `NonceGuard::guarded` so check, increment and persist are one section
//! - The reserved `nonce` key is readable but never writable through `set`

use std::sync::Arc;

use tracing::{debug, error};
use types::numeric::encode_u64;

use crate::errors::ChaincodeError;
use crate::ledger::{check_caller_key, read_bytes, LedgerAccessor, NONCE_KEY};
use crate::nonce::{NonceGuard, NonceInit};

/// Confirmation of a guarded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub key: String,
    pub value: Vec<u8>,
    /// Nonce persisted alongside the value
    pub nonce: u64,
}

/// Key/value asset store backed by the host ledger.
pub struct AssetStore {
    ledger: Arc<dyn LedgerAccessor>,
    guard: NonceGuard,
}

impl AssetStore {
    pub fn new(ledger: Arc<dyn LedgerAccessor>) -> Self {
        Self {
            ledger,
            guard: NonceGuard::new(),
        }
    }

    /// Read the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Vec<u8>, ChaincodeError> {
        read_bytes(self.ledger.as_ref(), key)?.ok_or_else(|| ChaincodeError::NotFound {
            key: key.to_string(),
        })
    }

    /// Write `value` under `key`, consuming one nonce.
    ///
    /// `supplied` is the nonce the caller captured; `None` consumes whatever
    /// the counter currently holds. A failed value write is `Persistence`; a
    /// failed nonce write after the value landed is `PartialWrite`.
    pub fn set(
        &self,
        key: &str,
        value: &[u8],
        supplied: Option<u64>,
    ) -> Result<WriteReceipt, ChaincodeError> {
        check_caller_key(key)?;

        let ledger = self.ledger.as_ref();
        self.guard.guarded(ledger, supplied, |granted| {
            ledger.put(key, value).map_err(|source| {
                error!(key, %source, "asset write failed");
                ChaincodeError::Persistence {
                    key: key.to_string(),
                    source,
                }
            })?;

            ledger
                .put(NONCE_KEY, &encode_u64(granted))
                .map_err(|source| {
                    error!(key, nonce = granted, %source, "nonce write failed after asset write");
                    ChaincodeError::PartialWrite {
                        written: key.to_string(),
                        failed: NONCE_KEY.to_string(),
                        source,
                    }
                })?;

            debug!(key, nonce = granted, "asset written");
            Ok(WriteReceipt {
                key: key.to_string(),
                value: value.to_vec(),
                nonce: granted,
            })
        })
    }

    /// Next nonce a `set` must present.
    pub fn nonce(&self) -> Result<u64, ChaincodeError> {
        self.guard.current_or_hydrate(self.ledger.as_ref())
    }

    /// Hydrate the guard and create the reserved key if it is missing.
    pub fn initialize(&self) -> Result<NonceInit, ChaincodeError> {
        self.guard.initialize(self.ledger.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;
    use proptest::prelude::*;

    fn setup_store() -> (Arc<MemoryLedger>, AssetStore) {
        let ledger = Arc::new(MemoryLedger::new());
        let store = AssetStore::new(ledger.clone());
        (ledger, store)
    }

    // ─── Get tests ───

    #[test]
    fn test_get_missing_key() {
        let (_, store) = setup_store();
        assert_eq!(
            store.get("alice"),
            Err(ChaincodeError::NotFound {
                key: "alice".to_string()
            })
        );
    }

    #[test]
    fn test_get_empty_value_is_not_found() {
        let (ledger, store) = setup_store();
        ledger.put_raw("alice", b"");
        assert!(matches!(store.get("alice"), Err(ChaincodeError::NotFound { .. })));
    }

    #[test]
    fn test_get_read_failure() {
        let (ledger, store) = setup_store();
        ledger.fail_reads_of("alice");
        assert!(matches!(store.get("alice"), Err(ChaincodeError::Access { .. })));
    }

    #[test]
    fn test_get_reserved_nonce_key() {
        let (ledger, store) = setup_store();
        ledger.put_raw(NONCE_KEY, b"3");
        assert_eq!(store.get(NONCE_KEY), Ok(b"3".to_vec()));
    }

    // ─── Set tests ───

    #[test]
    fn test_set_then_get() {
        let (ledger, store) = setup_store();
        let receipt = store.set("alice", b"100", None).unwrap();
        assert_eq!(receipt.nonce, 1);
        assert_eq!(store.get("alice"), Ok(b"100".to_vec()));
        assert_eq!(ledger.raw(NONCE_KEY), Some(b"1".to_vec()));
    }

    #[test]
    fn test_set_overwrites() {
        let (_, store) = setup_store();
        store.set("alice", b"100", None).unwrap();
        store.set("alice", b"250", None).unwrap();
        assert_eq!(store.get("alice"), Ok(b"250".to_vec()));
    }

    #[test]
    fn test_set_with_captured_nonce_then_replay() {
        let (ledger, store) = setup_store();
        let nonce = store.nonce().unwrap();
        assert_eq!(nonce, 0);

        store.set("alice", b"100", Some(nonce)).unwrap();
        let replay = store.set("alice", b"100", Some(nonce));
        assert_eq!(
            replay,
            Err(ChaincodeError::DoubleSpend {
                supplied: 0,
                current: 1
            })
        );
        assert_eq!(ledger.raw(NONCE_KEY), Some(b"1".to_vec()));
    }

    #[test]
    fn test_set_rejected_writes_nothing() {
        let (ledger, store) = setup_store();
        let writes_before = ledger.write_count();
        let result = store.set("alice", b"100", Some(7));
        assert!(matches!(result, Err(ChaincodeError::DoubleSpend { .. })));
        assert_eq!(ledger.write_count(), writes_before);
        assert_eq!(ledger.raw("alice"), None);
    }

    #[test]
    fn test_set_reserved_key_rejected() {
        let (_, store) = setup_store();
        let result = store.set(NONCE_KEY, b"0", None);
        assert!(matches!(result, Err(ChaincodeError::MalformedArgument(_))));
    }

    #[test]
    fn test_set_empty_key_rejected() {
        let (_, store) = setup_store();
        assert!(matches!(
            store.set("", b"x", None),
            Err(ChaincodeError::MalformedArgument(_))
        ));
    }

    #[test]
    fn test_set_value_write_failure() {
        let (ledger, store) = setup_store();
        ledger.fail_puts_to("alice");
        let result = store.set("alice", b"100", Some(0));
        assert!(matches!(result, Err(ChaincodeError::Persistence { .. })));
        // Counter stays advanced; the captured nonce is spent.
        assert_eq!(store.nonce(), Ok(1));
        assert_eq!(ledger.raw(NONCE_KEY), None);
    }

    #[test]
    fn test_set_nonce_write_failure_is_partial_write() {
        let (ledger, store) = setup_store();
        ledger.fail_puts_to(NONCE_KEY);
        let result = store.set("alice", b"100", None);
        match result {
            Err(ChaincodeError::PartialWrite { written, failed, .. }) => {
                assert_eq!(written, "alice");
                assert_eq!(failed, NONCE_KEY);
            }
            other => panic!("expected PartialWrite, got {other:?}"),
        }
        assert_eq!(ledger.raw("alice"), Some(b"100".to_vec()));
    }

    #[test]
    fn test_restart_hydrates_from_ledger() {
        let (ledger, store) = setup_store();
        store.set("alice", b"100", Some(0)).unwrap();
        store.set("bob", b"5", Some(1)).unwrap();

        // New process over the same ledger.
        let restarted = AssetStore::new(ledger.clone());
        let replay = restarted.set("alice", b"999", Some(0));
        assert!(matches!(replay, Err(ChaincodeError::DoubleSpend { .. })));
        assert_eq!(restarted.nonce(), Ok(2));
        assert_eq!(restarted.get("alice"), Ok(b"100".to_vec()));
    }

    proptest! {
        #[test]
        fn prop_set_get_round_trip(key in "[a-z][a-z0-9_]{0,15}", value in proptest::collection::vec(any::<u8>(), 1..64)) {
            prop_assume!(key != NONCE_KEY);
            let (_, store) = setup_store();
            store.set(&key, &value, None).unwrap();
            prop_assert_eq!(store.get(&key), Ok(value));
        }
    }
}
