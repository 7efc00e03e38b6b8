//! Scan loop commands

use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;
use tracing::info;

use crate::browser::CdpSurfaceFactory;
use crate::config::Config;
use crate::scheduler::{CycleStatus, ScanPoller};
use crate::service::{PushoverNotifier, SystemClock};

/// Loads and validates the full configuration
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

fn build_poller(config: Config) -> Result<ScanPoller> {
    info!(
        "Portal: {}, Chrome: {}, auto-accept: {}",
        config.portal.login_url, config.portal.cdp_endpoint, config.policy.auto_claim
    );

    let factory = Arc::new(CdpSurfaceFactory::new(config.portal.cdp_endpoint.clone()));
    let notifier = Arc::new(PushoverNotifier::new(&config.notify)?);
    Ok(ScanPoller::new(config, factory, notifier, Arc::new(SystemClock)))
}

/// Scan forever
pub async fn run() -> Result<()> {
    let mut poller = build_poller(load_config()?)?;
    poller.run().await
}

/// Scan once and print the cycle report
pub async fn scan_once() -> Result<()> {
    let mut poller = build_poller(load_config()?)?;

    let Some(report) = poller.run_once().await else {
        anyhow::bail!("Scan cycle failed; see the log above");
    };

    let status = format!("{:?}", report.status);
    let status = match report.status {
        CycleStatus::Scanned => status.green(),
        CycleStatus::BoardEmpty => status.yellow(),
        CycleStatus::LoginFailed | CycleStatus::Unrecognized => status.red(),
    };

    println!("{} {}", "Cycle:".bold(), status);
    println!("  Rows:       {}", report.rows);
    println!("  Listings:   {}", report.listings);
    println!("  Seen:       {}", report.known.to_string().dimmed());
    println!("  Skipped:    {}", report.skipped);
    println!("  Notified:   {}", report.notified.to_string().cyan());
    println!("  Claimed:    {}", report.claimed.to_string().green());
    println!("  Lost:       {}", report.lost.to_string().red());
    println!("  Remembered: {}", poller.state().ledger.len());
    Ok(())
}
