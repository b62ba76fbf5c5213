//! Peer Directory
//!
//! Answers "who am I, who is in my passel, and what are the shared credentials". Handlers
//! resolve it on every request so the coordinator only ever sees a `PasselContext`.

use crate::config::{IdentityConfig, PasselConfig, PossumConfig};
use crate::error::PasselError;
use crate::types::{Passel, PasselContext};
use std::fmt;

/// Basic-auth credentials shared by every possum in the passel
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Source of identity, passel membership and credentials
pub trait PeerDirectory: Send + Sync {
    /// Public URIs of this instance, without scheme
    fn application_uris(&self) -> Result<Vec<String>, PasselError>;

    /// Passel members in configuration order
    fn passel(&self) -> Result<Passel, PasselError>;

    fn credentials(&self) -> Result<Credentials, PasselError>;

    /// Snapshot handed to a single coordinator call
    fn context(&self) -> Result<PasselContext, PasselError> {
        Ok(PasselContext::new(self.application_uris()?, self.passel()?))
    }
}

/// Directory backed by the loaded configuration
#[derive(Debug, Clone)]
pub struct ConfigDirectory {
    identity: IdentityConfig,
    passel: PasselConfig,
}

impl ConfigDirectory {
    pub fn new(identity: IdentityConfig, passel: PasselConfig) -> Self {
        Self { identity, passel }
    }

    pub fn from_config(config: &PossumConfig) -> Self {
        Self::new(config.identity.clone(), config.passel.clone())
    }
}

impl PeerDirectory for ConfigDirectory {
    fn application_uris(&self) -> Result<Vec<String>, PasselError> {
        Ok(self.identity.application_uris.clone())
    }

    fn passel(&self) -> Result<Passel, PasselError> {
        if let Some(blank) = self.passel.members.iter().position(|m| m.trim().is_empty()) {
            return Err(PasselError::Configuration(format!(
                "Passel member at position {} is blank",
                blank
            )));
        }
        Ok(self.passel.members.clone())
    }

    fn credentials(&self) -> Result<Credentials, PasselError> {
        let username = self.passel.username.as_deref().unwrap_or_default();
        let password = self.passel.password.as_deref().unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(PasselError::Configuration(
                "Passel username and password must both be configured".to_string(),
            ));
        }
        Ok(Credentials::new(username, password))
    }
}
