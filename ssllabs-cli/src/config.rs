//! Configuration module
//!
//! Turns the global CLI flags into a client configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use ssllabs_client::{ClientConfig, SslLabsClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Versioned API base URL
    pub api_url: String,
    /// Seconds between status polls
    pub poll_interval_secs: u64,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.as_str())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
    }

    /// Build a client for this configuration
    pub fn client(&self) -> Result<SslLabsClient> {
        SslLabsClient::new(self.client_config()).context("Failed to create SSL Labs client")
    }
}
