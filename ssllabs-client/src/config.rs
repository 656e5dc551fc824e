//! Client configuration
//!
//! Defines the remote location, the poll interval and the per-request
//! timeout. Both timings are configurable so tests and slow networks can
//! tune them.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default versioned base location of the SSL Labs API
pub const DEFAULT_API_URL: &str = "https://api.ssllabs.com/api/v2";

/// Longest accepted poll interval
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Versioned API base URL (e.g., "https://api.ssllabs.com/api/v2")
    pub api_base_url: String,

    /// How often a running assessment is polled
    pub poll_interval: Duration,

    /// Maximum time a single request may take before it is aborted
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Events buffered per subscriber before slow receivers start lagging
    pub event_capacity: usize,
}

impl ClientConfig {
    /// Creates a new configuration with defaults for the given base URL
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_millis(5000),
            user_agent: default_user_agent(),
            event_capacity: 64,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables:
    /// - SSLLABS_API_URL (optional, default: https://api.ssllabs.com/api/v2)
    /// - SSLLABS_POLL_INTERVAL (optional, seconds, default: 30)
    /// - SSLLABS_REQUEST_TIMEOUT_MS (optional, milliseconds, default: 5000)
    /// - SSLLABS_EVENT_CAPACITY (optional, default: 64)
    pub fn from_env() -> Self {
        let mut config = std::env::var("SSLLABS_API_URL")
            .map(Self::new)
            .unwrap_or_default();

        if let Some(interval) = env_parse::<u64>("SSLLABS_POLL_INTERVAL") {
            config.poll_interval = Duration::from_secs(interval);
        }

        if let Some(timeout) = env_parse::<u64>("SSLLABS_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(timeout);
        }

        if let Some(capacity) = env_parse::<usize>("SSLLABS_EVENT_CAPACITY") {
            config.event_capacity = capacity;
        }

        config
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ClientError::Config(
                "api_base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ClientError::Config(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(ClientError::Config(format!(
                "poll_interval must not exceed {:?}",
                MAX_POLL_INTERVAL
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout >= self.poll_interval {
            return Err(ClientError::Config(format!(
                "request_timeout ({:?}) must be shorter than poll_interval ({:?})",
                self.request_timeout, self.poll_interval
            )));
        }

        if self.event_capacity == 0 {
            return Err(ClientError::Config(
                "event_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn default_user_agent() -> String {
    format!("ssllabs-client/{}", env!("CARGO_PKG_VERSION"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}
