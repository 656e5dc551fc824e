//! Response decoder
//!
//! Turns completed response bodies into either a classified assessment
//! status (analyze polling) or a plain JSON payload (single-shot endpoints).

use serde_json::Value as JsonValue;
use ssllabs_core::domain::assessment::{AssessmentStatus, ProgressStatus};
use ssllabs_core::domain::report::AssessmentReport;

use crate::dispatcher::RawResponse;
use crate::error::{ClientError, Result};

const NO_BODY: &str = "No Response Body Received";

/// What the polling session does with one classified response
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Keep polling
    Continue(ProgressStatus),
    /// Assessment finished
    Ready(AssessmentReport),
    /// Assessment failed, or the response could not be understood
    Failed(ClientError),
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Continue(_))
    }
}

fn parse_body(response: &RawResponse) -> Result<JsonValue> {
    if response.body.is_empty() {
        return Err(ClientError::protocol(NO_BODY));
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// Classifies an analyze response by its `status` field
pub fn classify(response: &RawResponse) -> Result<AssessmentStatus> {
    let json = parse_body(response)?;

    let status = match json.get("status").and_then(JsonValue::as_str) {
        Some("READY") => AssessmentStatus::Ready(AssessmentReport::new(json)),
        Some("DNS") => AssessmentStatus::Dns,
        Some("IN_PROGRESS") => AssessmentStatus::InProgress,
        Some("ERROR") => {
            let message = json
                .get("statusMessage")
                .and_then(JsonValue::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            AssessmentStatus::Error(message)
        }
        _ => AssessmentStatus::Unrecognized(json),
    };

    Ok(status)
}

/// Maps a classified status to what polling should do next
///
/// Anything that is neither transient nor READY ends the session as a
/// failure, unrecognized statuses included.
pub fn outcome(status: AssessmentStatus) -> PollOutcome {
    match status {
        AssessmentStatus::Dns => PollOutcome::Continue(ProgressStatus::Dns),
        AssessmentStatus::InProgress => PollOutcome::Continue(ProgressStatus::InProgress),
        AssessmentStatus::Ready(report) => PollOutcome::Ready(report),
        AssessmentStatus::Error(message) => {
            PollOutcome::Failed(ClientError::RemoteReported(message))
        }
        AssessmentStatus::Unrecognized(raw) => PollOutcome::Failed(ClientError::protocol(
            format!("Unknown Response Received: {}", raw),
        )),
    }
}

/// Classifies a poll result, folding transport errors into a failure
pub fn poll_outcome(result: Result<RawResponse>) -> PollOutcome {
    match result.and_then(|response| classify(&response)) {
        Ok(status) => outcome(status),
        Err(e) => PollOutcome::Failed(e),
    }
}

/// Decodes the payload of a single-shot endpoint
pub fn decode_payload(response: &RawResponse) -> Result<JsonValue> {
    if !response.is_success() {
        return Err(ClientError::RemoteReported(format!(
            "HTTP {}: {}",
            response.status, response.body
        )));
    }
    parse_body(response)
}
