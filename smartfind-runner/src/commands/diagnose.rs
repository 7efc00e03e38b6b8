//! Setup and troubleshooting commands

use anyhow::{Context, Result};
use colored::*;
use smartfind_core::domain::JobListing;
use smartfind_core::parser::{ParsedRow, parse_row};
use tracing::warn;

use crate::browser::{CdpSurfaceFactory, Surface};
use crate::config::{NotifyConfig, PortalConfig, env_lookup};
use crate::service::DEFAULT_TITLE;

/// Sends one message and prints the API's answer
pub async fn test_push(message: &str) -> Result<()> {
    let config = NotifyConfig::from_lookup(&env_lookup)?;
    println!("{}", "Sending test notification...".bold());

    let client = config.client()?;
    match client.send(message, DEFAULT_TITLE).await {
        Ok(delivery) => {
            println!(
                "  {} status {} (request {})",
                "Delivered:".green(),
                delivery.status,
                delivery.request.dimmed()
            );
            Ok(())
        }
        Err(e) => {
            println!("  {} {}", "Rejected:".red(), e);
            Err(e).context("Test notification failed")
        }
    }
}

/// Opens the login page and lists the inputs found in each frame
pub async fn inspect_inputs() -> Result<()> {
    let config = PortalConfig::browser_only(&env_lookup)?;
    let surface = CdpSurfaceFactory::new(config.cdp_endpoint.clone())
        .open_page()
        .await?;

    let result = async {
        surface.navigate(&config.login_url).await?;
        surface.describe_inputs().await
    }
    .await;

    if let Err(e) = surface.close().await {
        warn!("Failed to close browser page: {:#}", e);
    }

    let frames = result?;
    println!(
        "{}",
        format!("Found {} rendering context(s):", frames.len()).bold()
    );
    for (index, (frame, inputs)) in frames.iter().enumerate() {
        let label = if frame.is_top() { "top document" } else { frame.url.as_str() };
        println!();
        println!("  {} Context {} {}", "▸".cyan(), index, label.dimmed());
        if inputs.is_empty() {
            println!("    {}", "no text inputs".yellow());
        }
        for input in inputs {
            println!(
                "    id={:<16} name={:<16} type={}",
                input.id,
                input.name,
                input.kind
            );
        }
    }
    Ok(())
}

/// Runs the listing extractor on one row of text
pub fn parse(text: &str) -> Result<()> {
    match parse_row(text) {
        ParsedRow::Listing(listing) => print_listing(&listing),
        ParsedRow::NotAListing => println!("{}", "Not a listing".yellow()),
    }
    Ok(())
}

fn print_listing(listing: &JobListing) {
    let time = listing
        .time_range
        .map_or_else(|| "-".to_string(), |range| range.to_string());

    println!("  {} {}", "▸".cyan(), listing.summary.bold());
    println!("    Date:        {}", listing.date);
    println!("    Time:        {}", time);
    println!("    Duration:    {:.2} h", listing.duration_hours);
    println!("    Location:    {}", listing.location);
    println!("    Fingerprint: {}", listing.fingerprint().as_str().dimmed());
}
