//! SSL Labs CLI
//!
//! Command-line interface for running SSL Labs assessments.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ssllabs")]
#[command(about = "SSL Labs assessment CLI", long_about = None)]
struct Cli {
    /// Versioned API base URL
    #[arg(
        long,
        env = "SSLLABS_API_URL",
        default_value = ssllabs_client::config::DEFAULT_API_URL
    )]
    api_url: String,

    /// Seconds between status polls of a running assessment
    #[arg(long, env = "SSLLABS_POLL_INTERVAL", default_value_t = 30)]
    poll_interval: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "SSLLABS_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    request_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ssllabs_cli=info,ssllabs_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        poll_interval_secs: cli.poll_interval,
        request_timeout_ms: cli.request_timeout,
    };

    handle_command(cli.command, &config).await
}
