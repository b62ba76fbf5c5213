//! Core types shared across the passel coordination layers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Possum identifier: the URI a peer instance is reachable at (e.g. `https://possum-a.example.com`)
pub type PossumId = String;

/// Ordered list of possums making up the passel, in configuration order
pub type Passel = Vec<PossumId>;

/// Possum -> state mapping.
///
/// A `BTreeMap` so equality is structural and serialized output has sorted keys.
pub type PasselState = BTreeMap<PossumId, PossumState>;

/// Lifecycle state of a single possum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PossumState {
    Alive,
    Dead,
}

impl PossumState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PossumState::Alive => "alive",
            PossumState::Dead => "dead",
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, PossumState::Alive)
    }
}

impl fmt::Display for PossumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a state string is neither `alive` nor `dead`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidState(pub String);

impl fmt::Display for InvalidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"The state should have been "alive" or "dead" not "{}""#,
            self.0
        )
    }
}

impl std::error::Error for InvalidState {}

impl FromStr for PossumState {
    type Err = InvalidState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alive" => Ok(PossumState::Alive),
            "dead" => Ok(PossumState::Dead),
            other => Err(InvalidState(other.to_string())),
        }
    }
}

// Hand-written so a bad value surfaces the domain message instead of serde's variant list.
impl Serialize for PossumState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PossumState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-operation snapshot of the node's identity and passel membership.
///
/// Resolved fresh from the peer directory for every request and handed to the coordinator,
/// so a coordinator never holds configuration of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasselContext {
    /// Public URIs this instance is reachable at, without scheme (e.g. `possum-a.example.com`)
    pub application_uris: Vec<String>,
    /// Configured passel members, in order
    pub passel: Passel,
}

impl PasselContext {
    pub fn new(application_uris: Vec<String>, passel: Passel) -> Self {
        Self {
            application_uris,
            passel,
        }
    }

    /// Find the passel entry naming this node.
    ///
    /// URIs are tried in order against passel entries in order; the first match wins.
    pub fn matched_possum(&self) -> Option<&PossumId> {
        self.application_uris.iter().find_map(|uri| {
            self.passel
                .iter()
                .find(|possum| uri_possum_match(uri, possum))
        })
    }

    pub fn contains(&self, possum: &str) -> bool {
        self.passel.iter().any(|p| p == possum)
    }
}

/// A passel entry matches an application URI iff it is that URI behind `http://` or `https://`
pub fn uri_possum_match(uri: &str, possum: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        possum
            .strip_prefix(scheme)
            .map(|rest| rest == uri)
            .unwrap_or(false)
    })
}

/// Outcome of a passel-wide read or write: every peer's snapshot, in passel order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub passel_states: Vec<PasselState>,
}
