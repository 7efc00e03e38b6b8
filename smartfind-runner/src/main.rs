//! SmartFind agent
//!
//! Watches the SmartFind substitute-teacher portal for open jobs, claims
//! the ones that fit the user's rules, and pushes everything else to
//! their phone.
//!
//! Architecture:
//! - Configuration: settings from the environment and an optional `.env`
//! - Browser: a [`browser::Surface`] over Chrome's DevTools protocol
//! - Services: login, blocked dates, claim protocol, notifications
//! - Scheduler: the scan loop and the memory it keeps between cycles
//!
//! One scan runs at a time on a single-threaded runtime.

mod browser;
mod commands;
mod config;
mod portal;
mod scheduler;
mod service;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "smartfind")]
#[command(about = "SmartFind job watcher and auto-claimer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartfind=info,smartfind_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    if matches!(command, Commands::Run) {
        info!("Starting SmartFind agent");
    }

    if let Err(e) = handle_command(command).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}
