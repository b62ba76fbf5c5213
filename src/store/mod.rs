//! Possum State Store
//!
//! Durable record of the desired state of every possum in the passel, as seen by this node.
//! Records are seeded once at startup and afterwards only changed by coordinated writes.

pub mod persistence;

pub use persistence::SledStateStore;

use crate::error::StorageError;
use crate::types::{PasselState, PossumId, PossumState};

/// State Store interface
pub trait StateStore {
    /// Current state of one possum; `PossumNotFound` if it was never seeded
    fn get(&self, possum: &str) -> Result<PossumState, StorageError>;

    /// Current state of every listed possum; fails on the first missing one
    fn get_all(&self, possums: &[PossumId]) -> Result<PasselState, StorageError> {
        let mut states = PasselState::new();
        for possum in possums {
            states.insert(possum.clone(), self.get(possum)?);
        }
        Ok(states)
    }

    fn set(&self, possum: &str, state: PossumState) -> Result<(), StorageError>;

    /// Seed an `alive` record for every possum that has none yet.
    ///
    /// Existing records are left as they are so a restart never resurrects a dead possum.
    fn initialize(&self, passel: &[PossumId]) -> Result<(), StorageError>;
}
