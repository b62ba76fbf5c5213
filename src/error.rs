//! Error types for the passel coordination service.

use crate::types::{PasselState, PossumId};
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not find possum {0} in db")]
    PossumNotFound(PossumId),

    #[error("Corrupt state record for possum {possum}: {reason}")]
    CorruptRecord { possum: PossumId, reason: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Which step of a passel-wide operation found the peers disagreeing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyStage {
    Check,
    BeforeUpdate,
    AfterUpdate,
}

impl ConsistencyStage {
    pub fn message(&self) -> &'static str {
        match self {
            ConsistencyStage::Check => "State was inconsistent",
            ConsistencyStage::BeforeUpdate => "State was inconsistent before update",
            ConsistencyStage::AfterUpdate => "State was inconsistent after update",
        }
    }
}

/// Errors surfaced by passel coordination operations
#[derive(Debug, Error)]
pub enum PasselError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No uris were configured")]
    NoApplicationUris,

    #[error("Passel had 0 members")]
    EmptyPassel,

    #[error("Could not match any possum in db")]
    NoMatchingPossum,

    #[error("Could not find possum {0} in db")]
    NotFound(PossumId),

    #[error("{0}")]
    Validation(String),

    #[error("Would have killed all possums")]
    SafetyViolation,

    #[error("Could not reach possum {peer}: {reason}")]
    PeerUnreachable { peer: PossumId, reason: String },

    /// Malformed envelope, or an error the peer reported itself (passed through verbatim)
    #[error("{reason}")]
    PeerProtocol { peer: PossumId, reason: String },

    #[error("{}", stage_message(.stage))]
    Inconsistent {
        stage: ConsistencyStage,
        passel_states: Vec<PasselState>,
    },

    #[error("State should have been: {} but was {}", render(.expected), render(.actual))]
    VerificationFailed {
        expected: PasselState,
        actual: PasselState,
    },

    #[error("401 Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for PasselError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PossumNotFound(possum) => PasselError::NotFound(possum),
            other => PasselError::Storage(other),
        }
    }
}

impl From<config::ConfigError> for PasselError {
    fn from(err: config::ConfigError) -> Self {
        PasselError::Configuration(err.to_string())
    }
}

fn stage_message(stage: &ConsistencyStage) -> &'static str {
    stage.message()
}

fn render(state: &PasselState) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| format!("{:?}", state))
}
