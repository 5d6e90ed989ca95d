// Rendezvous for sessions that need two file arrivals before starting.
//
// Two independently-delivered files that share a parent identifier form
// one two-channel session. The first arrival parks under the parent key;
// the second claims it and the pair starts. Check and insert happen in a
// single critical section, so two concurrent arrivals for the same parent
// can never both park or both claim.

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of offering one file arrival to the rendezvous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrival {
    /// First file for this parent; parked until its partner shows up.
    Waiting,
    /// Second file; the pair is ready, in arrival order.
    Ready { first: String, second: String },
}

/// Keyed table of half-arrived sessions.
#[derive(Default)]
pub struct PendingSessions {
    inner: Mutex<HashMap<String, String>>,
}

impl PendingSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the arrival of `key` under `parent`.
    ///
    /// Atomic per parent: exactly one of two concurrent arrivals for the
    /// same parent observes `Ready`.
    pub async fn offer(&self, parent: &str, key: String) -> Arrival {
        let mut inner = self.inner.lock().await;
        match inner.remove(parent) {
            Some(first) => {
                info!("Session pair ready for {}: {} + {}", parent, first, key);
                Arrival::Ready { first, second: key }
            }
            None => {
                debug!("Parking first arrival for {}: {}", parent, key);
                inner.insert(parent.to_string(), key);
                Arrival::Waiting
            }
        }
    }

    /// Drop a stale half-pair, returning its parked key if one existed.
    pub async fn abandon(&self, parent: &str) -> Option<String> {
        self.inner.lock().await.remove(parent)
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}
