//! Peer Client
//!
//! Outbound HTTP calls to other possums. Every call is a single attempt with a bounded
//! timeout; the caller decides what a failure means for its fan-out.

use crate::config::PeerConfig;
use crate::directory::Credentials;
use crate::error::PasselError;
use crate::types::PasselState;
#[cfg(test)]
use crate::types::PossumId;
use crate::wire::{ConsistencyEnvelope, PossumStatesEnvelope, SetPasselStateRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const PASSEL_STATE_PATH: &str = "/v1/passel_state";
const STATE_PATH: &str = "/v1/state";
const CONSISTENCY_PATH: &str = "/v1/passel_state_consistency";

/// Peer calls the coordinator depends on
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// The peer's view of the whole passel (`GET /v1/passel_state`)
    async fn fetch_state(&self, peer: &str) -> Result<PasselState, PasselError>;

    /// Ask the peer to apply `desired` locally (`POST /v1/state`); returns its verified
    /// after-write view of the passel
    async fn push_state(
        &self,
        peer: &str,
        desired: &PasselState,
        credentials: &Credentials,
    ) -> Result<PasselState, PasselError>;
}

// Map transport failures to PeerUnreachable
fn map_http_error(peer: &str, error: reqwest::Error) -> PasselError {
    let reason = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else if error.is_builder() {
        format!("Invalid peer URI: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    PasselError::PeerUnreachable {
        peer: peer.to_string(),
        reason,
    }
}

fn endpoint(peer: &str, path: &str) -> String {
    format!("{}{}", peer.trim_end_matches('/'), path)
}

/// reqwest-backed peer client
#[derive(Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    pub fn new(config: &PeerConfig) -> Result<Self, PasselError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if config.ca_cert.exists() {
            let pem = std::fs::read(&config.ca_cert).map_err(|e| {
                PasselError::Configuration(format!(
                    "Failed to read CA certificate {}: {}",
                    config.ca_cert.display(),
                    e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                PasselError::Configuration(format!(
                    "Invalid CA certificate {}: {}",
                    config.ca_cert.display(),
                    e
                ))
            })?;
            debug!(ca_cert = %config.ca_cert.display(), "Trusting extra root certificate");
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| PasselError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Send a request and decode its JSON body. Status codes are not inspected: peers put
    /// failures in the envelope's `error` field.
    async fn send<T: DeserializeOwned>(
        &self,
        peer: &str,
        request: RequestBuilder,
    ) -> Result<T, PasselError> {
        let response = request.send().await.map_err(|e| map_http_error(peer, e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| map_http_error(peer, e))?;

        serde_json::from_str(&body).map_err(|e| {
            debug!(peer = %peer, status = %status, error = %e, "Couldn't decode peer response");
            PasselError::PeerProtocol {
                peer: peer.to_string(),
                reason: format!("Invalid response from possum {}: {}", peer, e),
            }
        })
    }

    fn unwrap_states(peer: &str, envelope: PossumStatesEnvelope) -> Result<PasselState, PasselError> {
        if let Some(error) = envelope.error.filter(|e| !e.is_empty()) {
            debug!(peer = %peer, error = %error, "Peer reported an error");
            return Err(PasselError::PeerProtocol {
                peer: peer.to_string(),
                reason: error,
            });
        }
        envelope.possum_states.ok_or_else(|| PasselError::PeerProtocol {
            peer: peer.to_string(),
            reason: format!("Invalid response from possum {}: missing possum_states", peer),
        })
    }

    /// Ask `node` to check the consistency of its passel (`GET /v1/passel_state_consistency`).
    ///
    /// The envelope is returned as-is, including an inconsistent verdict or a reported error.
    pub async fn passel_consistency(&self, node: &str) -> Result<ConsistencyEnvelope, PasselError> {
        let url = endpoint(node, CONSISTENCY_PATH);
        debug!(node = %node, url = %url, "Requesting passel consistency");
        self.send(node, self.client.get(&url)).await
    }

    /// Ask `node` to apply `desired` across its whole passel (`POST /v1/passel_state`)
    pub async fn set_passel_state(
        &self,
        node: &str,
        desired: &PasselState,
        force: bool,
        credentials: &Credentials,
    ) -> Result<ConsistencyEnvelope, PasselError> {
        let url = endpoint(node, PASSEL_STATE_PATH);
        let body = SetPasselStateRequest {
            possum_states: desired.clone(),
            force,
        };
        debug!(node = %node, url = %url, force, "Submitting passel state");
        let request = self
            .client
            .post(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .json(&body);
        self.send(node, request).await
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_state(&self, peer: &str) -> Result<PasselState, PasselError> {
        let url = endpoint(peer, PASSEL_STATE_PATH);
        debug!(peer = %peer, url = %url, "Fetching passel state");
        let envelope: PossumStatesEnvelope = self.send(peer, self.client.get(&url)).await?;
        Self::unwrap_states(peer, envelope)
    }

    async fn push_state(
        &self,
        peer: &str,
        desired: &PasselState,
        credentials: &Credentials,
    ) -> Result<PasselState, PasselError> {
        let url = endpoint(peer, STATE_PATH);
        debug!(peer = %peer, url = %url, changes = desired.len(), "Pushing desired state");
        let request = self
            .client
            .post(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .json(desired);
        let envelope: PossumStatesEnvelope = self.send(peer, request).await?;
        Self::unwrap_states(peer, envelope)
    }
}

/// Peer client for coordinator tests: serves canned answers and records every call
#[cfg(test)]
pub struct MockPeerClient {
    fetch: std::collections::HashMap<PossumId, Result<PasselState, String>>,
    push: std::collections::HashMap<PossumId, Result<PasselState, String>>,
    local: Option<(PossumId, std::sync::Arc<dyn crate::store::StateStore + Send + Sync>, Vec<PossumId>)>,
    calls: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockPeerClient {
    pub fn new() -> Self {
        Self {
            fetch: Default::default(),
            push: Default::default(),
            local: None,
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn with_fetch(mut self, peer: &str, answer: Result<PasselState, String>) -> Self {
        self.fetch.insert(peer.to_string(), answer);
        self
    }

    pub fn with_push(mut self, peer: &str, answer: Result<PasselState, String>) -> Self {
        self.push.insert(peer.to_string(), answer);
        self
    }

    /// Answer fetches for `possum` from `store`, the way a node's own endpoint would
    pub fn with_local(
        mut self,
        possum: &str,
        store: std::sync::Arc<dyn crate::store::StateStore + Send + Sync>,
        passel: Vec<PossumId>,
    ) -> Self {
        self.local = Some((possum.to_string(), store, passel));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn answer(
        peer: &str,
        answer: Option<&Result<PasselState, String>>,
    ) -> Result<PasselState, PasselError> {
        match answer {
            Some(Ok(state)) => Ok(state.clone()),
            Some(Err(message)) => Err(PasselError::PeerProtocol {
                peer: peer.to_string(),
                reason: message.clone(),
            }),
            None => Err(PasselError::PeerUnreachable {
                peer: peer.to_string(),
                reason: "Connection error: no such peer".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl PeerClient for MockPeerClient {
    async fn fetch_state(&self, peer: &str) -> Result<PasselState, PasselError> {
        self.calls.lock().push(format!("fetch {}", peer));
        if let Some((possum, store, passel)) = &self.local {
            if possum == peer {
                return store.get_all(passel).map_err(PasselError::from);
            }
        }
        Self::answer(peer, self.fetch.get(peer))
    }

    async fn push_state(
        &self,
        peer: &str,
        _desired: &PasselState,
        _credentials: &Credentials,
    ) -> Result<PasselState, PasselError> {
        self.calls.lock().push(format!("push {}", peer));
        Self::answer(peer, self.push.get(peer))
    }
}
