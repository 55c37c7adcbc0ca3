//! Speaking gate: the orchestrator's "is speaking" flag and request identity.
//!
//! Every `speak` call takes a fresh [`RequestId`]; every engine callback
//! and timer carries the id it was issued for. The flag may only be
//! flipped by a holder of the current id, and the compare-and-flip happens
//! under one lock so that a `stop` racing with a late chunk callback can
//! never leave the flag set.
//!
//! Observers (the recognition coordinator, a UI) subscribe to the flag
//! through a `watch` channel.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Opaque, monotonically increasing identity of a speech request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Raw counter value, for logging.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct GateInner {
    current: Mutex<u64>,
    speaking: watch::Sender<bool>,
}

/// Shared speaking flag plus the current request identity.
///
/// Cloning shares state.
#[derive(Debug, Clone)]
pub struct SpeakingGate {
    inner: Arc<GateInner>,
}

impl SpeakingGate {
    /// Create a new gate (initially silent, no request issued).
    #[must_use]
    pub fn new() -> Self {
        let (speaking, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(GateInner {
                current: Mutex::new(0),
                speaking,
            }),
        }
    }

    /// Issue a new request id, superseding whatever was current.
    ///
    /// The flag is left alone: the superseding request clears it when it
    /// finishes, or sets it when its first chunk starts.
    pub fn begin_request(&self) -> RequestId {
        let mut current = self.lock();
        *current += 1;
        RequestId(*current)
    }

    /// Invalidate the current request and clear the flag (explicit stop).
    pub fn invalidate(&self) {
        let mut current = self.lock();
        *current += 1;
        self.set_flag(false);
        tracing::debug!("Speaking gate: stopped, flag cleared");
    }

    /// Whether `id` is still the current request.
    #[must_use]
    pub fn is_current(&self, id: RequestId) -> bool {
        *self.lock() == id.0
    }

    /// Set the flag if `id` is current. Returns whether it was current.
    pub fn mark_speaking(&self, id: RequestId) -> bool {
        let current = self.lock();
        if *current != id.0 {
            return false;
        }
        self.set_flag(true);
        true
    }

    /// Clear the flag if `id` is current. Returns whether it was current.
    pub fn mark_finished(&self, id: RequestId) -> bool {
        let current = self.lock();
        if *current != id.0 {
            return false;
        }
        self.set_flag(false);
        true
    }

    /// Check whether speech is currently audible.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        *self.inner.speaking.borrow()
    }

    /// Subscribe to flag changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.speaking.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Only notifies subscribers on an actual change.
    fn set_flag(&self, value: bool) {
        self.inner.speaking.send_if_modified(|flag| {
            let changed = *flag != value;
            *flag = value;
            changed
        });
    }
}

impl Default for SpeakingGate {
    fn default() -> Self {
        Self::new()
    }
}
