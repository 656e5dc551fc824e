//! Error types for the SSL Labs client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the SSL Labs client
///
/// Errors are `Clone` because they travel to every subscriber of the event
/// channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection, DNS, reset or abort, including timeout-triggered aborts
    #[error("Transport error: {0}")]
    Transport(String),

    /// Empty or malformed response body, or an unrecognized status
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The service reported the failure itself
    #[error("Remote error: {0}")]
    RemoteReported(String),

    /// Caller input rejected before any request was made
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of a [`ClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    RemoteReported,
    InvalidRequest,
    Config,
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::RemoteReported(_) => ErrorKind::RemoteReported,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// The message without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport(m)
            | Self::Protocol(m)
            | Self::RemoteReported(m)
            | Self::InvalidRequest(m)
            | Self::Config(m) => m,
        }
    }

    /// Check if this error came from the network rather than the service
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if the service reported this error itself
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteReported(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {}", e))
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(format!("Failed to parse JSON response: {}", e))
    }
}
