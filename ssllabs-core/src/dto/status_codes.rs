//! Status code catalog DTO

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response of the `getStatusCodes` endpoint
///
/// Maps status detail codes (e.g. `TESTING_PROTOCOL_INTOLERANCE_399`) to
/// their English descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusCodes {
    pub status_details: BTreeMap<String, String>,
}

impl StatusCodes {
    /// Parse the raw payload delivered with a status codes event
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Description for a status detail code
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.status_details.get(code).map(String::as_str)
    }
}
