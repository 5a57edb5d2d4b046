// src/main.rs

//! scratchorg
//!
//! Entry point for the scratchorg CLI.
//!
//! Creates disposable scratch orgs on the first configured dev hub that
//! still has capacity. All real work is delegated to the `runner` module.
//!
//! Responsibilities of this file:
//! - Load `.env`, parse CLI arguments and read config.yaml
//! - Initialise logging
//! - Map the runner's outcome to a process exit code

mod auth;
mod cli;
mod config;
mod error;
mod hub;
mod logging;
mod messages;
mod provision;
mod runner;
mod sinks;
mod state;
mod util;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::Config;
use crate::error::CreateError;
use crate::messages::Messages;
use crate::runner::RunContext;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let outcome = match prepare(&cli) {
        Ok(ctx) => runner::run(cli, &ctx).await,
        Err(e) => Err(CreateError::Other(e)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Resolve the config path, load config.yaml and start logging.
fn prepare(cli: &cli::Cli) -> Result<RunContext> {
    let config_path = match &cli.config {
        Some(p) => p.clone(),
        None => default_config_path()?,
    };

    let config = Config::load(&config_path)?;
    logging::init(&config.logging.level);
    tracing::debug!(config = %config_path.display(), hubs = config.hubs.len(), "loaded config");

    Ok(RunContext::new(config, config_path, Messages::load(), cli.json))
}

fn default_config_path() -> Result<PathBuf> {
    Ok(util::scratchorg_home()?.join("config.yaml"))
}
