//! Per-user token balance cache
//!
//! Read-through over the ledger, which stays the source of truth. An entry is
//! evicted before every write and repopulated only after the ledger accepted
//! the new value, so a failed write can never leave the cache ahead of the
//! ledger.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};
use types::numeric::encode_u64;

use crate::errors::ChaincodeError;
use crate::ledger::{read_u64, LedgerAccessor};

#[derive(Debug, Default)]
pub struct BalanceCache {
    entries: Mutex<HashMap<String, u64>>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for `user_id`, loading it from the ledger on a miss.
    /// An absent ledger value is a zero balance.
    pub fn balance(&self, ledger: &dyn LedgerAccessor, user_id: &str) -> Result<u64, ChaincodeError> {
        let mut entries = self.lock();
        if let Some(balance) = entries.get(user_id) {
            return Ok(*balance);
        }
        let balance = read_u64(ledger, user_id)?.unwrap_or(0);
        debug!(user_id, balance, "balance loaded from ledger");
        entries.insert(user_id.to_string(), balance);
        Ok(balance)
    }

    /// Persist `balance` for `user_id` and refresh the entry.
    pub fn store(
        &self,
        ledger: &dyn LedgerAccessor,
        user_id: &str,
        balance: u64,
    ) -> Result<(), ChaincodeError> {
        let mut entries = self.lock();
        entries.remove(user_id);
        ledger
            .put(user_id, &encode_u64(balance))
            .map_err(|source| {
                error!(user_id, balance, %source, "balance write failed");
                ChaincodeError::Persistence {
                    key: user_id.to_string(),
                    source,
                }
            })?;
        entries.insert(user_id.to_string(), balance);
        Ok(())
    }

    /// Cached entry without touching the ledger.
    pub fn cached(&self, user_id: &str) -> Option<u64> {
        self.lock().get(user_id).copied()
    }

    /// Drop the entry for `user_id`. Called after any other write to the
    /// same ledger key.
    pub fn evict(&self, user_id: &str) {
        if self.lock().remove(user_id).is_some() {
            debug!(user_id, "balance evicted");
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;

    #[test]
    fn test_balance_absent_is_zero() {
        let ledger = MemoryLedger::new();
        let cache = BalanceCache::new();
        assert_eq!(cache.balance(&ledger, "alice"), Ok(0));
        assert_eq!(cache.cached("alice"), Some(0));
    }

    #[test]
    fn test_balance_reads_through_once() {
        let ledger = MemoryLedger::with_entries([("alice", "40")]);
        let cache = BalanceCache::new();
        assert_eq!(cache.balance(&ledger, "alice"), Ok(40));

        // Out-of-band change is not seen until the next write or clear.
        ledger.put_raw("alice", b"41");
        assert_eq!(cache.balance(&ledger, "alice"), Ok(40));
        cache.clear();
        assert_eq!(cache.balance(&ledger, "alice"), Ok(41));
    }

    #[test]
    fn test_balance_corrupt_value() {
        let ledger = MemoryLedger::with_entries([("alice", "lots")]);
        let cache = BalanceCache::new();
        let result = cache.balance(&ledger, "alice");
        assert!(matches!(result, Err(ChaincodeError::CorruptValue { .. })));
        assert_eq!(cache.cached("alice"), None);
    }

    #[test]
    fn test_store_updates_ledger_and_cache() {
        let ledger = MemoryLedger::new();
        let cache = BalanceCache::new();
        cache.store(&ledger, "alice", 7).unwrap();
        assert_eq!(ledger.raw("alice"), Some(b"7".to_vec()));
        assert_eq!(cache.cached("alice"), Some(7));
    }

    #[test]
    fn test_evict_forces_reload() {
        let ledger = MemoryLedger::with_entries([("alice", "7")]);
        let cache = BalanceCache::new();
        cache.balance(&ledger, "alice").unwrap();

        ledger.put_raw("alice", b"5");
        cache.evict("alice");
        assert_eq!(cache.cached("alice"), None);
        assert_eq!(cache.balance(&ledger, "alice"), Ok(5));

        // Evicting an absent entry is a no-op.
        cache.evict("bob");
        assert_eq!(cache.cached("bob"), None);
    }

    #[test]
    fn test_store_failure_evicts_entry() {
        let ledger = MemoryLedger::with_entries([("alice", "3")]);
        let cache = BalanceCache::new();
        cache.balance(&ledger, "alice").unwrap();

        ledger.fail_puts_to("alice");
        let result = cache.store(&ledger, "alice", 9);
        assert!(matches!(result, Err(ChaincodeError::Persistence { .. })));
        assert_eq!(cache.cached("alice"), None);
        assert_eq!(ledger.raw("alice"), Some(b"3".to_vec()));
    }
}
