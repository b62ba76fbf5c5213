//! Local write serialization
//!
//! Coordinated writes run "fetch baseline, guard, write, re-verify" as one sequence. Two
//! requests interleaving on the same node could both pass the guard against the same
//! baseline, so each sequence holds a lock for its duration. The locks are async because
//! they are held across peer calls. They only order requests arriving at this node.

use crate::types::PossumId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Hands out one lock per possum plus a node-wide lock for passel-wide updates
#[derive(Default)]
pub struct PossumLockManager {
    locks: Mutex<HashMap<PossumId, Arc<AsyncMutex<()>>>>,
    passel_lock: AsyncMutex<()>,
}

impl PossumLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding single-possum writes on this node
    pub fn get_lock(&self, possum: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(possum.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Lock guarding passel-wide updates started from this node.
    ///
    /// Distinct from the per-possum locks: a passel-wide update relays to this node's own
    /// single-possum endpoint while holding it.
    pub fn passel_lock(&self) -> &AsyncMutex<()> {
        &self.passel_lock
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}
