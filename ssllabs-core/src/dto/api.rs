//! Outbound API calls

use std::fmt;

/// Endpoints of the SSL Labs API used by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEndpoint {
    Info,
    Analyze,
    GetEndpointData,
    GetStatusCodes,
}

impl ApiEndpoint {
    /// Path segment below the versioned base location
    pub fn path(&self) -> &'static str {
        match self {
            ApiEndpoint::Info => "info",
            ApiEndpoint::Analyze => "analyze",
            ApiEndpoint::GetEndpointData => "getEndpointData",
            ApiEndpoint::GetStatusCodes => "getStatusCodes",
        }
    }
}

/// A single GET request against the API
///
/// Query pairs are kept unencoded; the transport encodes them when it builds
/// the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub endpoint: ApiEndpoint,
    pub query: Vec<(&'static str, String)>,
}

impl ApiCall {
    pub fn new(endpoint: ApiEndpoint) -> Self {
        Self {
            endpoint,
            query: Vec::new(),
        }
    }

    /// Appends a query parameter
    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// `info` call
    pub fn info() -> Self {
        Self::new(ApiEndpoint::Info)
    }

    /// `getStatusCodes` call
    pub fn status_codes() -> Self {
        Self::new(ApiEndpoint::GetStatusCodes)
    }

    /// `getEndpointData` call for one endpoint of a previously assessed host
    pub fn endpoint_data(host: &str, endpoint: &str) -> Self {
        Self::new(ApiEndpoint::GetEndpointData)
            .param("host", host)
            .param("s", endpoint)
    }

    /// Value of the first query parameter named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint.path())?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}
