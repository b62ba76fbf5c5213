//! Persistence layer for the State Store

use crate::error::StorageError;
use crate::store::StateStore;
use crate::types::{PossumId, PossumState};
use bincode;
use sled;
use std::path::Path;
use tracing::debug;

const STATE_TREE: &str = "state";

/// Sled-based implementation of StateStore
pub struct SledStateStore {
    db: sled::Db,
    states: sled::Tree,
}

fn io_error(kind: std::io::ErrorKind, context: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::IoError(std::io::Error::new(kind, format!("{}: {}", context, err)))
}

impl SledStateStore {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| io_error(std::io::ErrorKind::Other, "Failed to open sled database", e))?;
        let states = db
            .open_tree(STATE_TREE)
            .map_err(|e| io_error(std::io::ErrorKind::Other, "Failed to open state tree", e))?;
        Ok(Self { db, states })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| io_error(std::io::ErrorKind::Other, "Failed to flush database", e))?;
        Ok(())
    }

    fn decode(possum: &str, bytes: &[u8]) -> Result<PossumState, StorageError> {
        let raw: String = bincode::deserialize(bytes).map_err(|e| StorageError::CorruptRecord {
            possum: possum.to_string(),
            reason: e.to_string(),
        })?;
        raw.parse().map_err(|e: crate::types::InvalidState| StorageError::CorruptRecord {
            possum: possum.to_string(),
            reason: e.to_string(),
        })
    }

    fn encode(state: PossumState) -> Result<Vec<u8>, StorageError> {
        bincode::serialize(state.as_str()).map_err(|e| {
            io_error(std::io::ErrorKind::InvalidData, "Failed to serialize state", e)
        })
    }
}

impl StateStore for SledStateStore {
    fn get(&self, possum: &str) -> Result<PossumState, StorageError> {
        match self
            .states
            .get(possum.as_bytes())
            .map_err(|e| io_error(std::io::ErrorKind::Other, "Failed to get possum state", e))?
        {
            Some(value) => Self::decode(possum, &value),
            None => {
                debug!(possum = %possum, "Possum missing from store");
                Err(StorageError::PossumNotFound(possum.to_string()))
            }
        }
    }

    fn set(&self, possum: &str, state: PossumState) -> Result<(), StorageError> {
        let value = Self::encode(state)?;
        self.states
            .insert(possum.as_bytes(), value)
            .map_err(|e| io_error(std::io::ErrorKind::Other, "Failed to update possum state", e))?;
        // Blocks until the write is on disk; async callers run this on the blocking pool
        self.flush()?;
        debug!(possum = %possum, state = %state, "Wrote possum state");
        Ok(())
    }

    fn initialize(&self, passel: &[PossumId]) -> Result<(), StorageError> {
        for possum in passel {
            let value = Self::encode(PossumState::Alive)?;
            // compare_and_swap from None only inserts when the record is absent
            let outcome = self
                .states
                .compare_and_swap(possum.as_bytes(), None as Option<&[u8]>, Some(value))
                .map_err(|e| io_error(std::io::ErrorKind::Other, "Failed to seed possum state", e))?;
            match outcome {
                Ok(()) => debug!(possum = %possum, "Inserted alive state into store"),
                Err(existing) => {
                    let state = existing
                        .current
                        .as_deref()
                        .map(|bytes| Self::decode(possum, bytes))
                        .transpose()?;
                    debug!(possum = %possum, state = ?state, "Retrieved existing state");
                }
            }
        }
        self.flush()
    }
}
