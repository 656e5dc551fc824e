//! Analyze command handler
//!
//! Starts an assessment, follows its progress and prints the report once
//! the service marks it READY.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::*;
use ssllabs_client::{AssessmentReport, ClientEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::config::Config;

/// Arguments of the `analyze` command
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Host to assess
    pub host: String,

    /// Accept a cached report
    #[arg(long, conflicts_with = "start_new")]
    pub from_cache: bool,

    /// Maximum age of a cached report, in hours
    #[arg(long, requires = "from_cache")]
    pub max_age: Option<u64>,

    /// Ignore cached reports and start a new assessment
    #[arg(long)]
    pub start_new: bool,

    /// Print the raw JSON report
    #[arg(long)]
    pub json: bool,
}

/// Run an assessment to completion
pub async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let client = config.client()?;
    let mut events = client.subscribe();

    let generation = if args.start_new {
        client.analyze_new(&args.host)?
    } else if args.from_cache {
        client.analyze_cached(&args.host, args.max_age.map(hours))?
    } else {
        client.analyze(&args.host)?
    };

    println!(
        "{} {} {}",
        "▸".cyan(),
        "Assessing".bold(),
        args.host.cyan()
    );

    loop {
        match events.recv().await {
            Ok(ClientEvent::Progress {
                generation: g,
                status,
            }) if g == generation => {
                println!("  {} {}", "…".dimmed(), status.to_string().yellow());
            }
            Ok(ClientEvent::Success {
                generation: g,
                report,
            }) if g == generation => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(report.raw())?);
                } else {
                    print_report(&args.host, &report);
                }
                return Ok(());
            }
            Ok(ClientEvent::Failure {
                generation: Some(g),
                error,
            }) if g == generation => {
                println!("{} {}", "✗".red(), error.to_string().red());
                return Err(error.into());
            }
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Missed {} event(s)", skipped);
            }
            Err(RecvError::Closed) => anyhow::bail!("Event channel closed"),
        }
    }
}

fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(3600))
}

/// Print a completed assessment
fn print_report(host: &str, report: &AssessmentReport) {
    println!("\n{}", "Assessment complete:".bold());
    println!("  Host:     {}", report.host().unwrap_or(host).cyan());
    if let Some(tested) = report.test_time() {
        println!(
            "  Tested:   {}",
            tested.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        );
    }

    let endpoints = report.endpoints();
    if endpoints.is_empty() {
        println!("{}", "  No endpoints reported.".yellow());
        return;
    }

    println!("\n{}", format!("{} endpoint(s):", endpoints.len()).bold());
    for endpoint in endpoints {
        let grade = endpoint
            .grade
            .as_deref()
            .map(colorize_grade)
            .unwrap_or_else(|| "-".dimmed());

        println!("  {} {}  {}", "▸".cyan(), endpoint.ip_address, grade);
        if let Some(name) = &endpoint.server_name {
            println!("    Server:  {}", name.dimmed());
        }
        if let Some(message) = &endpoint.status_message {
            println!("    Status:  {}", message);
        }
        if endpoint.has_warnings {
            println!("    {}", "Has warnings".yellow());
        }
    }
}

/// Colorize a grade for display
pub(super) fn colorize_grade(grade: &str) -> ColoredString {
    match grade.chars().next() {
        Some('A') => grade.green().bold(),
        Some('B') | Some('C') => grade.yellow(),
        Some('T') | Some('M') => grade.red(),
        _ => grade.red().bold(),
    }
}
