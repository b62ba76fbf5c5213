//! JSON envelopes exchanged between possums.
//!
//! Every instance is both server and client of these shapes, so one definition serves
//! the HTTP handlers and the peer client.

use crate::types::{PasselState, PossumState};
use serde::{Deserialize, Serialize};

/// `GET /v1/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: PossumState,
}

/// `GET /v1/passel_state` and `POST /v1/state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossumStatesEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possum_states: Option<PasselState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PossumStatesEnvelope {
    pub fn states(possum_states: PasselState) -> Self {
        Self {
            possum_states: Some(possum_states),
            error: None,
        }
    }
}

/// `GET /v1/passel_state_consistency` and `POST /v1/passel_state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyEnvelope {
    #[serde(default)]
    pub consistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passel_states: Option<Vec<PasselState>>,
}

/// Body of `POST /v1/passel_state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPasselStateRequest {
    pub possum_states: PasselState,
    #[serde(default)]
    pub force: bool,
}

/// Body of every error response without a more specific shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}
