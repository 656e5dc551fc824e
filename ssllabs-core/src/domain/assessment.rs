//! Assessment domain types

use std::time::Duration;

use crate::domain::report::AssessmentReport;
use crate::dto::api::{ApiCall, ApiEndpoint};

/// How the service should treat previously cached results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Let the service decide; a running or cached assessment may be returned
    #[default]
    None,
    /// Accept a cached report, optionally no older than `max_age`
    UseCache { max_age: Option<Duration> },
    /// Discard any cached report and start a new assessment
    ForceNew,
}

/// A request to assess one host
///
/// Immutable once built; the polling session derives both its start call
/// and its per-tick poll call from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentRequest {
    target_host: String,
    cache_mode: CacheMode,
}

impl AssessmentRequest {
    pub fn new(target_host: impl Into<String>, cache_mode: CacheMode) -> Self {
        Self {
            target_host: target_host.into(),
            cache_mode,
        }
    }

    pub fn target_host(&self) -> &str {
        &self.target_host
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    /// The call that starts the assessment
    pub fn start_call(&self) -> ApiCall {
        let call = ApiCall::new(ApiEndpoint::Analyze).param("host", self.target_host.as_str());

        match self.cache_mode {
            CacheMode::None => call,
            CacheMode::UseCache { max_age } => {
                let call = call.param("fromCache", "on").param("all", "done");
                match max_age {
                    Some(age) => call.param("maxAge", max_age_hours(age).to_string()),
                    None => call,
                }
            }
            CacheMode::ForceNew => call.param("startNew", "on").param("all", "done"),
        }
    }

    /// The call issued on every poll tick
    ///
    /// Never carries `startNew`, otherwise each tick would restart the job.
    pub fn poll_call(&self) -> ApiCall {
        ApiCall::new(ApiEndpoint::Analyze).param("host", self.target_host.as_str())
    }
}

/// `maxAge` is expressed in whole hours, rounded up
fn max_age_hours(age: Duration) -> u64 {
    age.as_secs().div_ceil(3600).max(1)
}

/// Checks that a host name can be sent to the service as-is
pub fn validate_host(host: &str) -> Result<(), &'static str> {
    if host.is_empty() {
        return Err("host cannot be empty");
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err("host must be a bare host name");
    }
    Ok(())
}

/// Transient states of a running assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Dns,
    InProgress,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Dns => "DNS",
            ProgressStatus::InProgress => "IN_PROGRESS",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an assessment as reported by a single poll response
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentStatus {
    Dns,
    InProgress,
    Ready(AssessmentReport),
    Error(String),
    /// `status` missing or not one the client knows
    Unrecognized(serde_json::Value),
}

impl AssessmentStatus {
    /// Whether polling must stop after this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssessmentStatus::Dns | AssessmentStatus::InProgress)
    }

    /// The transient part of the status, if any
    pub fn progress(&self) -> Option<ProgressStatus> {
        match self {
            AssessmentStatus::Dns => Some(ProgressStatus::Dns),
            AssessmentStatus::InProgress => Some(ProgressStatus::InProgress),
            _ => None,
        }
    }
}
