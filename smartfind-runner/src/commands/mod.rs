//! Commands module
//!
//! Defines the agent's subcommands and their handlers. Each handler loads
//! only the configuration it needs.

mod diagnose;
mod watch;

use anyhow::Result;
use clap::Subcommand;

/// Top-level commands
#[derive(Subcommand)]
pub enum Commands {
    /// Watch the board and act on new jobs until stopped (default)
    Run,
    /// Run a single scan cycle and print what happened
    Scan,
    /// Send a test notification with the configured Pushover keys
    TestPush {
        /// Message body
        #[arg(long, default_value = "✅ It works! SmartFind notifications are set up.")]
        message: String,
    },
    /// List the input fields of every frame on the login page
    InspectInputs,
    /// Parse one row of job-table text and print the listing
    Parse {
        /// Row text; multiple arguments are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
}

/// Handle a command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run => watch::run().await,
        Commands::Scan => watch::scan_once().await,
        Commands::TestPush { message } => diagnose::test_push(&message).await,
        Commands::InspectInputs => diagnose::inspect_inputs().await,
        Commands::Parse { text } => diagnose::parse(&text.join(" ")),
    }
}
