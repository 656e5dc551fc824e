//! Endpoint command handler

use anyhow::Result;
use colored::*;
use serde_json::Value as JsonValue;
use ssllabs_client::ClientEvent;

use super::next_payload;
use crate::config::Config;

/// Fetch and display details of one endpoint
pub async fn show_endpoint(config: &Config, host: &str, ip: &str, json: bool) -> Result<()> {
    let client = config.client()?;
    let mut events = client.subscribe();

    client.endpoint_data(host, ip)?;

    let ClientEvent::EndpointData { payload, .. } = next_payload(&mut events).await? else {
        anyhow::bail!("Unexpected response to endpoint request");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{}", format!("Endpoint {} of {}:", ip, host).bold());
    print_field(&payload, "Server name", "serverName");
    print_field(&payload, "Status", "statusMessage");
    if let Some(grade) = payload.get("grade").and_then(JsonValue::as_str) {
        println!("  {:<12} {}", "Grade:", super::analyze::colorize_grade(grade));
    }
    print_field(&payload, "Trust-ignored", "gradeTrustIgnored");
    if payload.get("hasWarnings").and_then(JsonValue::as_bool) == Some(true) {
        println!("  {}", "Has warnings".yellow());
    }
    println!("\n{}", "Use --json for the full endpoint details.".dimmed());

    Ok(())
}

fn print_field(payload: &JsonValue, label: &str, key: &str) {
    if let Some(value) = payload.get(key).and_then(JsonValue::as_str) {
        println!("  {:<12} {}", format!("{}:", label), value);
    }
}
