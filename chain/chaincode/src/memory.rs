//! In-memory host collaborators
//!
//! Stand-ins for the ledger runtime, used by the tests and by the local
//! simulation:
//! - `MemoryLedger`: a key/value ledger with fault injection
//! - `ScriptedPeers`: canned sibling replies, failures and delays
//! - `LocalNetwork`: routes sibling calls to in-process `Chaincode` instances

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use types::errors::{InvokeError, LedgerError};
use types::numeric::encode_u64;
use types::response::PeerResponse;

use crate::dispatcher::Chaincode;
use crate::ledger::LedgerAccessor;
use crate::peer::PeerInvoker;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────── Ledger ─────────────────────────

#[derive(Debug, Default)]
struct Faults {
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
}

/// Ledger kept in a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    faults: Mutex<Faults>,
    writes: Mutex<usize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let ledger = Self::new();
        for (key, value) in entries {
            ledger.put_raw(key, value);
        }
        ledger
    }

    /// Make every read of `key` fail.
    pub fn fail_reads_of(&self, key: impl Into<String>) {
        lock(&self.faults).failing_reads.insert(key.into());
    }

    /// Make every write to `key` fail.
    pub fn fail_puts_to(&self, key: impl Into<String>) {
        lock(&self.faults).failing_writes.insert(key.into());
    }

    pub fn clear_faults(&self) {
        let mut faults = lock(&self.faults);
        faults.failing_reads.clear();
        faults.failing_writes.clear();
    }

    /// Stored value, bypassing faults.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).cloned()
    }

    /// Out-of-band write, bypassing faults. Not counted in `write_count`.
    pub fn put_raw(&self, key: impl Into<String>, value: impl AsRef<[u8]>) {
        lock(&self.entries).insert(key.into(), value.as_ref().to_vec());
    }

    /// Number of successful `put` calls.
    pub fn write_count(&self) -> usize {
        *lock(&self.writes)
    }

    /// Stored decimal value, if present and well formed.
    pub fn raw_u64(&self, key: &str) -> Option<u64> {
        self.raw(key)
            .and_then(|bytes| types::numeric::parse_u64(&bytes).ok())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.entries).keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LedgerAccessor for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if lock(&self.faults).failing_reads.contains(key) {
            return Err(LedgerError::Unavailable {
                reason: format!("injected read fault on {key}"),
            });
        }
        Ok(self.raw(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        if lock(&self.faults).failing_writes.contains(key) {
            return Err(LedgerError::Rejected {
                key: key.to_string(),
                reason: "injected write fault".to_string(),
            });
        }
        self.put_raw(key, value);
        *lock(&self.writes) += 1;
        Ok(())
    }
}

// ───────────────────────── Scripted peers ─────────────────────────

/// Behaviour of one scripted sibling.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(PeerResponse),
    Fail(InvokeError),
    Delayed(Duration, PeerResponse),
}

/// One recorded sibling invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCall {
    pub service: String,
    pub args: Vec<Vec<u8>>,
    pub channel: String,
}

/// Peer invoker answering from a fixed script per service.
///
/// Services without a script are reported as not installed.
#[derive(Debug, Default)]
pub struct ScriptedPeers {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<PeerCall>>,
}

impl ScriptedPeers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, service: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(service.into(), script);
        self
    }

    /// Sibling replying 200 with `value` in decimal.
    pub fn with_value(self, service: impl Into<String>, value: u64) -> Self {
        self.with_script(service, Script::Reply(PeerResponse::ok(encode_u64(value))))
    }

    pub fn calls(&self) -> Vec<PeerCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PeerInvoker for ScriptedPeers {
    async fn invoke(
        &self,
        service: &str,
        args: Vec<Vec<u8>>,
        channel: &str,
    ) -> Result<PeerResponse, InvokeError> {
        lock(&self.calls).push(PeerCall {
            service: service.to_string(),
            args,
            channel: channel.to_string(),
        });

        match self.scripts.get(service).cloned() {
            Some(Script::Reply(reply)) => Ok(reply),
            Some(Script::Fail(err)) => Err(err),
            Some(Script::Delayed(delay, reply)) => {
                tokio::time::sleep(delay).await;
                Ok(reply)
            }
            None => Err(InvokeError::UnknownService {
                service: service.to_string(),
                channel: channel.to_string(),
            }),
        }
    }
}

// ───────────────────────── Local network ─────────────────────────

/// Routes sibling calls to chaincode instances running in this process.
///
/// The first argument of a call is the function name, the rest are passed
/// through as UTF-8 strings, and the sibling's `Response` comes back as a
/// `PeerResponse`.
#[derive(Default)]
pub struct LocalNetwork {
    channel: String,
    services: RwLock<HashMap<String, Arc<Chaincode>>>,
    offline: RwLock<HashSet<String>>,
}

impl LocalNetwork {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }

    /// Install `chaincode` under `name` on this network's channel.
    pub fn install(&self, name: impl Into<String>, chaincode: Arc<Chaincode>) {
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), chaincode);
    }

    /// Make calls to `name` fail with a transport error.
    pub fn take_offline(&self, name: impl Into<String>) {
        self.offline
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into());
    }

    pub fn bring_online(&self, name: &str) {
        self.offline
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn route(&self, service: &str, channel: &str) -> Result<Arc<Chaincode>, InvokeError> {
        let unknown = || InvokeError::UnknownService {
            service: service.to_string(),
            channel: channel.to_string(),
        };
        if channel != self.channel {
            return Err(unknown());
        }
        if self
            .offline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(service)
        {
            return Err(InvokeError::Unreachable {
                service: service.to_string(),
                reason: "peer offline".to_string(),
            });
        }
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
            .ok_or_else(unknown)
    }
}

#[async_trait]
impl PeerInvoker for LocalNetwork {
    async fn invoke(
        &self,
        service: &str,
        args: Vec<Vec<u8>>,
        channel: &str,
    ) -> Result<PeerResponse, InvokeError> {
        let chaincode = self.route(service, channel)?;
        let mut args = args
            .into_iter()
            .map(|arg| String::from_utf8_lossy(&arg).into_owned());
        let function = args.next().unwrap_or_default();
        let rest: Vec<String> = args.collect();

        let response = chaincode.invoke(&function, &rest).await;
        Ok(response.into())
    }
}
