//! Service information command handlers
//!
//! Handles the `info`, `status-codes` and `version` commands.

use anyhow::{Context, Result};
use colored::*;
use ssllabs_client::ClientEvent;
use ssllabs_core::dto::info::ServiceInfo;
use ssllabs_core::dto::status_codes::StatusCodes;

use super::next_payload;
use crate::config::Config;

/// Fetch and display service information
pub async fn show_info(config: &Config) -> Result<()> {
    let client = config.client()?;
    let mut events = client.subscribe();

    client.info();

    let ClientEvent::Info(payload) = next_payload(&mut events).await? else {
        anyhow::bail!("Unexpected response to info request");
    };
    let info = ServiceInfo::from_value(payload).context("Failed to parse service info")?;

    println!("{}", "SSL Labs Service:".bold());
    println!("  Engine:      {}", info.engine_version.cyan());
    println!("  Criteria:    {}", info.criteria_version);
    println!(
        "  Assessments: {}/{}",
        info.current_assessments, info.max_assessments
    );
    println!("  Cool-off:    {} ms", info.new_assessment_cool_off);

    if !info.messages.is_empty() {
        println!("\n{}", "Messages:".bold());
        for message in &info.messages {
            println!("  {}", message.dimmed());
        }
    }

    Ok(())
}

/// Fetch and display the status code catalog
pub async fn show_status_codes(config: &Config) -> Result<()> {
    let client = config.client()?;
    let mut events = client.subscribe();

    client.status_codes();

    let ClientEvent::StatusCodes(payload) = next_payload(&mut events).await? else {
        anyhow::bail!("Unexpected response to status codes request");
    };
    let codes = StatusCodes::from_value(payload).context("Failed to parse status codes")?;

    if codes.status_details.is_empty() {
        println!("{}", "No status codes returned.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} status code(s):", codes.status_details.len()).bold()
    );
    for (code, description) in &codes.status_details {
        println!("  {} {}", code.cyan(), description.dimmed());
    }

    Ok(())
}

/// Display client identity and API location
pub fn show_version(config: &Config) -> Result<()> {
    let client = config.client()?;
    print!("{}", client.version());
    Ok(())
}
