//! Service information DTO

use serde::{Deserialize, Serialize};

/// Response of the `info` endpoint
///
/// Fields the service leaves out fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInfo {
    pub engine_version: String,
    pub criteria_version: String,
    pub max_assessments: u32,
    pub current_assessments: u32,
    /// Milliseconds to wait between starting new assessments
    pub new_assessment_cool_off: u64,
    pub messages: Vec<String>,
}

impl ServiceInfo {
    /// Parse the raw payload delivered with an info event
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
