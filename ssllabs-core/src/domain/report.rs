//! Completed assessment reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Payload of a READY analyze response
///
/// The report is kept as the raw JSON the service returned; accessors give
/// typed views of the few fields callers commonly need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentReport(JsonValue);

impl AssessmentReport {
    pub fn new(raw: JsonValue) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_raw(self) -> JsonValue {
        self.0
    }

    /// Assessed host name
    pub fn host(&self) -> Option<&str> {
        self.0.get("host").and_then(JsonValue::as_str)
    }

    /// IP address of the first endpoint
    pub fn first_endpoint_ip(&self) -> Option<&str> {
        self.0
            .get("endpoints")?
            .get(0)?
            .get("ipAddress")?
            .as_str()
    }

    /// Endpoint summaries; entries that do not parse are skipped
    pub fn endpoints(&self) -> Vec<EndpointSummary> {
        self.0
            .get("endpoints")
            .and_then(JsonValue::as_array)
            .map(|endpoints| {
                endpoints
                    .iter()
                    .filter_map(|e| serde_json::from_value(e.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// When the assessment completed
    pub fn test_time(&self) -> Option<DateTime<Utc>> {
        let millis = self.0.get("testTime")?.as_i64()?;
        DateTime::from_timestamp_millis(millis)
    }
}

/// Summary of one endpoint (IP address) of an assessed host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSummary {
    pub ip_address: String,
    pub server_name: Option<String>,
    pub status_message: Option<String>,
    pub grade: Option<String>,
    pub has_warnings: bool,
    pub progress: Option<i64>,
}
