use crate::domain::donation::AttemptStatus;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Verification attempts allowed per payment identifier.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy)]
struct Entry {
    attempts: u32,
    status: AttemptStatus,
}

#[derive(Debug, Default)]
struct RegistryState {
    in_flight: HashSet<String>,
    entries: HashMap<String, Entry>,
}

/// Result of asking the registry whether a verification may start.
#[derive(Debug)]
pub enum Admission<'a> {
    /// Another verification for this identifier has not finished yet.
    InProgress,
    /// The retry cap was reached earlier. Nothing more will be sent.
    Exhausted { attempts: u32 },
    Admitted(InFlightGuard<'a>),
}

/// Transient per-payment-identifier verification state.
///
/// Tracks which identifiers have a verification in flight and how many attempts
/// were counted against each. The lock is never held across an `.await`, so the
/// check-and-mark in [`VerificationRegistry::begin`] is a single step.
#[derive(Debug)]
pub struct VerificationRegistry {
    max_attempts: u32,
    state: Mutex<RegistryState>,
}

impl Default for VerificationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl VerificationRegistry {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Marks `pidx` as in flight and counts one attempt, unless a verification is
    /// already running or the cap has been reached.
    pub fn begin(&self, pidx: &str) -> Admission<'_> {
        let mut state = self.state.lock();
        if state.in_flight.contains(pidx) {
            return Admission::InProgress;
        }

        let entry = state.entries.entry(pidx.to_string()).or_insert(Entry {
            attempts: 0,
            status: AttemptStatus::Initiated,
        });
        if entry.attempts >= self.max_attempts {
            entry.status = AttemptStatus::Failed;
            return Admission::Exhausted {
                attempts: entry.attempts,
            };
        }
        entry.attempts += 1;
        entry.status = AttemptStatus::Verifying;
        state.in_flight.insert(pidx.to_string());

        Admission::Admitted(InFlightGuard {
            registry: self,
            pidx: pidx.to_string(),
        })
    }

    pub fn attempts(&self, pidx: &str) -> u32 {
        self.state
            .lock()
            .entries
            .get(pidx)
            .map_or(0, |entry| entry.attempts)
    }

    pub fn status(&self, pidx: &str) -> Option<AttemptStatus> {
        self.state.lock().entries.get(pidx).map(|entry| entry.status)
    }

    pub fn is_in_flight(&self, pidx: &str) -> bool {
        self.state.lock().in_flight.contains(pidx)
    }

    fn update(&self, pidx: &str, f: impl FnOnce(&mut Entry)) {
        if let Some(entry) = self.state.lock().entries.get_mut(pidx) {
            f(entry);
        }
    }
}

/// Holds the in-flight mark for one payment identifier.
///
/// The mark is released when the guard is dropped, whichever way the
/// verification ends.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    registry: &'a VerificationRegistry,
    pidx: String,
}

impl InFlightGuard<'_> {
    pub fn attempts(&self) -> u32 {
        self.registry.attempts(&self.pidx)
    }

    /// Payment settled. All transient state for the identifier is forgotten.
    pub fn complete(self) {
        self.registry.state.lock().entries.remove(&self.pidx);
    }

    /// Gateway has not settled yet. The attempt is not counted.
    pub fn pending(self) {
        self.registry.update(&self.pidx, |entry| {
            entry.attempts = entry.attempts.saturating_sub(1);
            entry.status = AttemptStatus::Pending;
        });
    }

    /// Backend answered with a non-success status. The attempt stays counted.
    pub fn rejected(self) {
        self.registry.update(&self.pidx, |entry| {
            entry.status = AttemptStatus::Initiated;
        });
    }

    /// The call itself failed. The attempt stays counted.
    pub fn failed(self) {
        self.registry.update(&self.pidx, |entry| {
            entry.status = AttemptStatus::VerificationFailed;
        });
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.state.lock().in_flight.remove(&self.pidx);
    }
}
