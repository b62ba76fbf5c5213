//! Possum CLI Binary
//!
//! Runs a possum instance or talks to one.

use anyhow::Context;
use clap::Parser;
use possum::cli::{Cli, Commands, RunContext};
use possum::config::ConfigLoader;
use possum::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Possum CLI starting");

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

/// Execute the command and print its output; false when the node reported a failure
async fn run(cli: &Cli) -> anyhow::Result<bool> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())
        .context("Error loading configuration")?;
    let output = context
        .execute(&cli.command)
        .await
        .with_context(|| format!("possum {} failed", cli.command.name()))?;
    if !output.text.is_empty() {
        println!("{}", output.text);
    }
    Ok(output.success)
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(&cli.workspace)
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    // Client commands print their result on stdout; keep logs off it
    if !matches!(cli.command, Commands::Serve { .. }) && config.output == "stdout" {
        config.output = "stderr".to_string();
        config.level = "warn".to_string();
    }

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}
