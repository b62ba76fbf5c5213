//! Configuration System
//!
//! Layered configuration for a possum instance: built-in defaults, a user-level file, a
//! workspace file (or an explicit file), then environment variables. The loaded
//! `PossumConfig` is validated once at startup and then only read.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PossumConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// How this instance recognises itself in the passel
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Passel membership and shared credentials
    #[serde(default)]
    pub passel: PasselConfig,

    /// Local state store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound peer calls
    #[serde(default)]
    pub peer: PeerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Value of `Access-Control-Allow-Origin`; `*` allows any origin
    #[serde(default = "default_cors_allowed")]
    pub cors_allowed: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_allowed() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            cors_allowed: default_cors_allowed(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Public URIs of this instance without scheme, e.g. `possum-a.example.com`
    #[serde(default)]
    pub application_uris: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasselConfig {
    /// Every possum in the passel, as full URIs (`https://possum-a.example.com`)
    #[serde(default)]
    pub members: Vec<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".possum/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra root certificate (PEM) trusted for peer TLS; ignored when the file is absent
    #[serde(default = "default_ca_cert")]
    pub ca_cert: PathBuf,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ca_cert() -> PathBuf {
    PathBuf::from("cacert.pem")
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            ca_cert: default_ca_cert(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Passel(String),
    Peer(String),
    System(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Passel(msg) => write!(f, "Passel: {}", msg),
            ValidationError::Peer(msg) => write!(f, "Peer: {}", msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PossumConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for member in &self.passel.members {
            if !(member.starts_with("http://") || member.starts_with("https://")) {
                errors.push(ValidationError::Passel(format!(
                    "Member '{}' must be an http:// or https:// URI",
                    member
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for member in &self.passel.members {
            if !seen.insert(member) {
                errors.push(ValidationError::Passel(format!(
                    "Member '{}' is listed more than once",
                    member
                )));
            }
        }

        if self.peer.connect_timeout_secs == 0 {
            errors.push(ValidationError::Peer(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.peer.request_timeout_secs == 0 {
            errors.push(ValidationError::Peer(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ValidationError::System(
                "Store path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Copy safe to print: the password is masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.passel.password.is_some() {
            copy.passel.password = Some("********".to_string());
        }
        copy
    }
}
