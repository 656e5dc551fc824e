//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod analyze;
mod endpoint;
mod info;

pub use analyze::AnalyzeArgs;

use anyhow::Result;
use clap::Subcommand;
use ssllabs_client::ClientEvent;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show service information
    Info,
    /// Assess a host and wait for the report
    Analyze(AnalyzeArgs),
    /// Show details of one endpoint of an assessed host
    Endpoint {
        /// Assessed host
        host: String,
        /// Endpoint IP address
        ip: String,
        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },
    /// List status detail codes and their descriptions
    StatusCodes,
    /// Show client identity and API location
    Version,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Info => info::show_info(config).await,
        Commands::Analyze(args) => analyze::handle_analyze(args, config).await,
        Commands::Endpoint { host, ip, json } => {
            endpoint::show_endpoint(config, &host, &ip, json).await
        }
        Commands::StatusCodes => info::show_status_codes(config).await,
        Commands::Version => info::show_version(config),
    }
}

/// Wait for the result of a single-shot request
///
/// Returns the first payload event, or the error of the first request
/// failure. Assessment events are skipped.
async fn next_payload(events: &mut broadcast::Receiver<ClientEvent>) -> Result<ClientEvent> {
    loop {
        match events.recv().await {
            Ok(ClientEvent::Failure {
                generation: None,
                error,
            }) => return Err(error.into()),
            Ok(
                event @ (ClientEvent::Info(_)
                | ClientEvent::StatusCodes(_)
                | ClientEvent::EndpointData { .. }),
            ) => return Ok(event),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => anyhow::bail!("Event channel closed"),
        }
    }
}
