//! CLI route: single route table and run context.

use crate::cli::parse::Commands;
use crate::cli::presentation::{format_consistency_json, format_consistency_text};
use crate::config::{ConfigLoader, PossumConfig};
use crate::directory::{ConfigDirectory, PeerDirectory};
use crate::error::PasselError;
use crate::peer::HttpPeerClient;
use crate::server;
use crate::types::{PasselState, PossumState};
use crate::wire::ConsistencyEnvelope;
use std::path::PathBuf;
use tracing::{debug, info};

/// Rendered command result; `success` is false when the node reported a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: the validated configuration
pub struct RunContext {
    config: PossumConfig,
}

impl RunContext {
    /// Load and validate configuration. Relative store paths resolve against the workspace.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PasselError> {
        let mut config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };

        if let Err(errors) = config.validate() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(PasselError::Configuration(messages.join("; ")));
        }

        if config.storage.path.is_relative() {
            config.storage.path = workspace_root.join(&config.storage.path);
        }
        debug!(store = %config.storage.path.display(), "Configuration loaded");
        Ok(Self { config })
    }

    pub fn config(&self) -> &PossumConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, PasselError> {
        info!(command = command.name(), "Executing command");
        match command {
            Commands::Serve { port } => {
                let mut config = self.config.clone();
                if let Some(port) = port {
                    config.server.port = *port;
                }
                server::serve(&config).await?;
                Ok(CommandOutput::ok(String::new()))
            }
            Commands::Status { node, format } => {
                let client = HttpPeerClient::new(&self.config.peer)?;
                let envelope = client.passel_consistency(node).await?;
                self.render(&envelope, format)
            }
            Commands::Set {
                node,
                changes,
                force,
                format,
            } => {
                let desired = parse_changes(changes)?;
                let credentials = ConfigDirectory::from_config(&self.config).credentials()?;
                let client = HttpPeerClient::new(&self.config.peer)?;
                let envelope = client
                    .set_passel_state(node, &desired, *force, &credentials)
                    .await?;
                self.render(&envelope, format)
            }
            Commands::Config => {
                let text = toml::to_string_pretty(&self.config.redacted()).map_err(|e| {
                    PasselError::Configuration(format!("Failed to render configuration: {}", e))
                })?;
                Ok(CommandOutput::ok(text))
            }
        }
    }

    fn render(&self, envelope: &ConsistencyEnvelope, format: &str) -> Result<CommandOutput, PasselError> {
        let text = match format {
            "json" => format_consistency_json(envelope)?,
            "text" => format_consistency_text(envelope, &self.config.passel.members),
            other => {
                return Err(PasselError::Validation(format!(
                    "Unknown format '{}' (expected text or json)",
                    other
                )))
            }
        };
        Ok(CommandOutput {
            text,
            success: envelope.consistent && envelope.error.is_none(),
        })
    }
}

/// Parse `possum=state` arguments. The possum is split at the last `=`.
pub(crate) fn parse_changes(changes: &[String]) -> Result<PasselState, PasselError> {
    let mut desired = PasselState::new();
    for change in changes {
        let (possum, state) = change.rsplit_once('=').ok_or_else(|| {
            PasselError::Validation(format!("Expected possum=state, got '{}'", change))
        })?;
        if possum.is_empty() {
            return Err(PasselError::Validation(format!(
                "Missing possum in '{}'",
                change
            )));
        }
        let state: PossumState = state
            .parse()
            .map_err(|e: crate::types::InvalidState| PasselError::Validation(e.to_string()))?;
        desired.insert(possum.to_string(), state);
    }
    Ok(desired)
}
