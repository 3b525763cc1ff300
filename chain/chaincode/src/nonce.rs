//! Nonce guard for the asset write path
//!
//! One monotonically increasing counter per process, mirrored into the
//! ledger under `NONCE_KEY`. The counter is the next unconsumed nonce: a
//! write presenting it consumes it, and any write presenting an older or a
//! future value is a double spend.
//!
//! The counter must be hydrated from the ledger before the first grant. A
//! process that starts at zero while the ledger holds a higher value would
//! accept replays of every nonce consumed before the restart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use types::numeric::encode_u64;

use crate::errors::ChaincodeError;
use crate::ledger::{read_u64, LedgerAccessor, NONCE_KEY};

#[derive(Debug, Clone, Copy, Default)]
struct NonceState {
    current: u64,
    hydrated: bool,
}

impl NonceState {
    /// Check-and-increment. `None` leaves the counter untouched.
    /// Callers check `exhausted` first.
    fn grant(&mut self, requested: u64) -> Option<u64> {
        if requested > self.current {
            return None;
        }
        self.current = self.current.checked_add(1)?;
        Some(self.current)
    }

    fn exhausted(&self) -> Result<(), ChaincodeError> {
        if self.current == u64::MAX {
            return Err(ChaincodeError::NonceExhausted {
                current: self.current,
            });
        }
        Ok(())
    }

    /// Raise the counter to at least `persisted`. Never lowers it.
    fn absorb(&mut self, persisted: u64) {
        self.current = self.current.max(persisted);
        self.hydrated = true;
    }
}

/// Result of initializing nonce state at deployment or upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceInit {
    pub nonce: u64,
    /// The reserved key was absent and has been written.
    pub created: bool,
}

/// Serialized nonce counter guarding the `set` path.
#[derive(Debug, Default)]
pub struct NonceGuard {
    state: Mutex<NonceState>,
}

impl NonceGuard {
    /// Create an unhydrated guard. The first ledger-backed call hydrates it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a guard whose counter is already known.
    pub fn hydrated_at(current: u64) -> Self {
        Self {
            state: Mutex::new(NonceState {
                current,
                hydrated: true,
            }),
        }
    }

    /// Current counter, or `None` before hydration.
    pub fn current(&self) -> Option<u64> {
        let state = self.lock();
        state.hydrated.then_some(state.current)
    }

    /// Whether the counter has been loaded from the ledger.
    pub fn is_hydrated(&self) -> bool {
        self.lock().hydrated
    }

    /// Grant `requested` if it does not exceed the counter.
    ///
    /// On grant the counter is incremented and the new value returned for
    /// the caller to persist. On reject the counter is unchanged. A counter
    /// at `u64::MAX` grants nothing and reports `NonceExhausted`.
    pub fn authorize(&self, requested: u64) -> Result<u64, ChaincodeError> {
        let mut state = self.lock();
        state.exhausted()?;
        let current = state.current;
        state
            .grant(requested)
            .ok_or(ChaincodeError::DoubleSpend {
                supplied: requested,
                current,
            })
    }

    /// Load the persisted nonce into the counter and return the counter.
    pub fn hydrate(&self, ledger: &dyn LedgerAccessor) -> Result<u64, ChaincodeError> {
        let mut state = self.lock();
        let persisted = read_u64(ledger, NONCE_KEY)?.unwrap_or(0);
        state.absorb(persisted);
        debug!(persisted, current = state.current, "nonce hydrated");
        Ok(state.current)
    }

    /// Counter value, hydrating first if this process has not yet done so.
    pub fn current_or_hydrate(&self, ledger: &dyn LedgerAccessor) -> Result<u64, ChaincodeError> {
        if let Some(current) = self.current() {
            return Ok(current);
        }
        self.hydrate(ledger)
    }

    /// Hydrate and make sure the reserved key exists on the ledger.
    ///
    /// Writes the counter only when the key is absent, so repeated calls
    /// never rewind a persisted nonce.
    pub fn initialize(&self, ledger: &dyn LedgerAccessor) -> Result<NonceInit, ChaincodeError> {
        let mut state = self.lock();
        let persisted = read_u64(ledger, NONCE_KEY)?;
        state.absorb(persisted.unwrap_or(0));

        let created = persisted.is_none();
        if created {
            ledger
                .put(NONCE_KEY, &encode_u64(state.current))
                .map_err(|source| ChaincodeError::Persistence {
                    key: NONCE_KEY.to_string(),
                    source,
                })?;
        }
        Ok(NonceInit {
            nonce: state.current,
            created,
        })
    }

    /// Run one guarded write.
    ///
    /// Under the guard's lock: hydrate if needed, read the persisted nonce,
    /// check the caller's nonce (when supplied) against the counter, grant
    /// against the persisted value, then call `write` with the granted value.
    /// The counter stays advanced even if `write` fails.
    pub fn guarded<T, F>(
        &self,
        ledger: &dyn LedgerAccessor,
        supplied: Option<u64>,
        write: F,
    ) -> Result<T, ChaincodeError>
    where
        F: FnOnce(u64) -> Result<T, ChaincodeError>,
    {
        let mut state = self.lock();
        let persisted = read_u64(ledger, NONCE_KEY)?.unwrap_or(0);
        if !state.hydrated {
            state.absorb(persisted);
            debug!(persisted, "nonce hydrated on first write");
        }

        if let Some(supplied) = supplied {
            if supplied != state.current {
                warn!(supplied, current = state.current, "rejecting stale or future nonce");
                return Err(ChaincodeError::DoubleSpend {
                    supplied,
                    current: state.current,
                });
            }
        }

        state.exhausted()?;
        let current = state.current;
        let Some(granted) = state.grant(persisted) else {
            warn!(persisted, current, "ledger nonce ahead of local counter");
            // Resynchronize so the next request is judged against the ledger.
            state.absorb(persisted);
            return Err(ChaincodeError::LedgerAhead { persisted, current });
        };
        debug!(granted, "nonce granted");
        write(granted)
    }

    fn lock(&self) -> MutexGuard<'_, NonceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
