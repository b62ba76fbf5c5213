//! CLI parse: clap types for possum. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Possum CLI - coordinated alive/dead state for a passel
#[derive(Parser)]
#[command(name = "possum")]
#[command(about = "Coordinated alive/dead state for a passel of identically deployed instances")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/ and relative store paths resolve against it)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a possum instance
    Serve {
        /// Listen port (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show a node's view of passel consistency
    Status {
        /// Base URI of the node to ask
        #[arg(long)]
        node: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Change possum states across a node's passel
    Set {
        /// Base URI of the node to submit to
        #[arg(long)]
        node: String,
        /// Changes as possum=state, e.g. https://possum-a.example.com=dead
        #[arg(required = true)]
        changes: Vec<String>,
        /// Skip the pre-update consistency check
        #[arg(long)]
        force: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Serve { .. } => "serve",
            Commands::Status { .. } => "status",
            Commands::Set { .. } => "set",
            Commands::Config => "config",
        }
    }
}
