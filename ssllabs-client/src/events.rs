//! Client events for pub/sub delivery.
//!
//! Everything the client produces asynchronously is published on one
//! `tokio::sync::broadcast` channel as a [`ClientEvent`]. The producer emits
//! without knowing about subscribers; each subscriber receives events
//! through its own receiver.
//!
//! There is no replay: a receiver only sees events emitted after it was
//! created, so subscribe before triggering an operation.
//!
//! ```ignore
//! let mut rx = client.subscribe();
//! let generation = client.analyze("example.com")?;
//! while let Ok(event) = rx.recv().await {
//!     if event.is_terminal() && event.generation() == Some(generation) {
//!         break;
//!     }
//! }
//! ```

use std::fmt;

use serde_json::Value as JsonValue;
use ssllabs_core::domain::assessment::ProgressStatus;
use ssllabs_core::domain::report::AssessmentReport;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::ClientError;

/// Identifies one polling session of a client
///
/// Generations increase monotonically per client; the first session is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events published by the client
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Assessment finished; terminal for its session
    Success {
        generation: Generation,
        report: AssessmentReport,
    },

    /// Assessment still running
    Progress {
        generation: Generation,
        status: ProgressStatus,
    },

    /// A request or session failed
    ///
    /// `generation` is set for polling sessions, where the failure is
    /// terminal, and `None` for single-shot requests.
    Failure {
        generation: Option<Generation>,
        error: ClientError,
    },

    /// Payload of the `info` endpoint
    Info(JsonValue),

    /// Payload of the `getEndpointData` endpoint
    EndpointData {
        host: String,
        endpoint: String,
        payload: JsonValue,
    },

    /// Payload of the `getStatusCodes` endpoint
    StatusCodes(JsonValue),
}

impl ClientEvent {
    /// Whether this event ends a polling session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClientEvent::Success { .. }
                | ClientEvent::Failure {
                    generation: Some(_),
                    ..
                }
        )
    }

    /// Polling session this event belongs to
    pub fn generation(&self) -> Option<Generation> {
        match self {
            ClientEvent::Success { generation, .. } | ClientEvent::Progress { generation, .. } => {
                Some(*generation)
            }
            ClientEvent::Failure { generation, .. } => *generation,
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Success { .. } => "success",
            ClientEvent::Progress { .. } => "progress",
            ClientEvent::Failure { .. } => "error",
            ClientEvent::Info(_) => "info",
            ClientEvent::EndpointData { .. } => "endpoint-data",
            ClientEvent::StatusCodes(_) => "status-codes",
        }
    }
}

/// Publishes [`ClientEvent`]s to all current subscribers
#[derive(Debug, Clone)]
pub struct EventNotifier {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventNotifier {
    /// Creates a notifier buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Emits an event; having no subscribers is not an error
    pub fn emit(&self, event: ClientEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => trace!(event = name, receivers, "Event emitted"),
            Err(_) => trace!(event = name, "Event dropped, no subscribers"),
        }
    }
}
