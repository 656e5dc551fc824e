//! SSL Labs HTTP Client
//!
//! An event-driven client for the SSL Labs assessment API.
//!
//! Assessments are long-running remote jobs: the client starts one, polls it
//! on a fixed interval until it reaches a terminal state, and publishes the
//! outcome to subscribers. Single-shot endpoints (service info, endpoint
//! details, status codes) publish their payload the same way.
//!
//! # Example
//!
//! ```no_run
//! use ssllabs_client::{ClientConfig, SslLabsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SslLabsClient::new(ClientConfig::default())?;
//!
//!     // Subscribe before starting, events are not replayed
//!     let mut events = client.subscribe();
//!     let generation = client.analyze_cached("example.com", None)?;
//!
//!     let report = SslLabsClient::wait_for_assessment(&mut events, generation).await?;
//!     println!("First endpoint: {:?}", report.first_endpoint_ip());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod poller;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind, Result};
pub use events::{ClientEvent, EventNotifier, Generation};
pub use ssllabs_core::domain::assessment::{AssessmentRequest, CacheMode, ProgressStatus};
pub use ssllabs_core::domain::report::AssessmentReport;

use std::sync::Arc;
use std::time::Duration;

use ssllabs_core::domain::assessment::validate_host;
use ssllabs_core::dto::api::ApiCall;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::dispatcher::{Dispatcher, HttpTransport, RequestHandle, Transport};
use crate::poller::AssessmentPoller;

/// Client for the SSL Labs API
///
/// Operations return immediately; their results arrive as [`ClientEvent`]s
/// on the channel returned by [`SslLabsClient::subscribe`]. One client runs
/// at most one assessment at a time: starting another cancels the first.
#[derive(Clone)]
pub struct SslLabsClient {
    config: ClientConfig,
    dispatcher: Dispatcher,
    notifier: EventNotifier,
    poller: AssessmentPoller,
}

impl SslLabsClient {
    /// Create a new client talking to the configured API over HTTPS
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::build(config, Arc::new(transport)))
    }

    /// Create a new client with a custom transport
    ///
    /// This allows you to route requests through a proxy layer or replay
    /// recorded responses.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, transport))
    }

    fn build(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let dispatcher = Dispatcher::new(transport, config.request_timeout);
        let notifier = EventNotifier::new(config.event_capacity);
        let poller =
            AssessmentPoller::new(dispatcher.clone(), notifier.clone(), config.poll_interval);

        Self {
            config,
            dispatcher,
            notifier,
            poller,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    /// Human-readable client identity
    pub fn version(&self) -> String {
        format!(
            "\r\nUser Agent  : {}\r\nAPI Location: {}\r\n",
            self.config.user_agent, self.config.api_base_url
        )
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.notifier.subscribe()
    }

    // =============================================================================
    // Assessments
    // =============================================================================

    /// Start an assessment, letting the service reuse a running one
    pub fn analyze(&self, host: &str) -> Result<Generation> {
        self.start_assessment(host, CacheMode::None)
    }

    /// Start an assessment that accepts cached results
    ///
    /// # Arguments
    /// * `host` - Host to assess
    /// * `max_age` - Oldest acceptable cached report, sent in whole hours
    pub fn analyze_cached(&self, host: &str, max_age: Option<Duration>) -> Result<Generation> {
        self.start_assessment(host, CacheMode::UseCache { max_age })
    }

    /// Start a new assessment, ignoring cached results
    pub fn analyze_new(&self, host: &str) -> Result<Generation> {
        self.start_assessment(host, CacheMode::ForceNew)
    }

    /// Start an assessment for a prepared request
    pub fn start(&self, request: &AssessmentRequest) -> Result<Generation> {
        validate_host(request.target_host())
            .map_err(|reason| ClientError::InvalidRequest(reason.to_string()))?;
        Ok(self.poller.start(request))
    }

    fn start_assessment(&self, host: &str, cache_mode: CacheMode) -> Result<Generation> {
        self.start(&AssessmentRequest::new(host, cache_mode))
    }

    /// Stop polling the running assessment, if any
    pub fn stop(&self) -> bool {
        self.poller.stop()
    }

    pub fn current_generation(&self) -> Generation {
        self.poller.current_generation()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    /// Wait for the terminal event of `generation`
    ///
    /// Events of other kinds and generations are skipped.
    pub async fn wait_for_assessment(
        events: &mut broadcast::Receiver<ClientEvent>,
        generation: Generation,
    ) -> Result<AssessmentReport> {
        loop {
            match events.recv().await {
                Ok(ClientEvent::Success {
                    generation: g,
                    report,
                }) if g == generation => return Ok(report),
                Ok(ClientEvent::Failure {
                    generation: Some(g),
                    error,
                }) if g == generation => return Err(error),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event receiver lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => {
                    return Err(ClientError::transport("event channel closed"));
                }
            }
        }
    }

    // =============================================================================
    // Single-shot endpoints
    // =============================================================================

    /// Fetch service information; emits [`ClientEvent::Info`]
    pub fn info(&self) -> RequestHandle {
        self.fetch(ApiCall::info(), ClientEvent::Info)
    }

    /// Fetch the status code catalog; emits [`ClientEvent::StatusCodes`]
    pub fn status_codes(&self) -> RequestHandle {
        self.fetch(ApiCall::status_codes(), ClientEvent::StatusCodes)
    }

    /// Fetch details of one endpoint of an assessed host; emits
    /// [`ClientEvent::EndpointData`]
    ///
    /// # Arguments
    /// * `host` - Previously assessed host
    /// * `endpoint` - Endpoint IP address, as listed in the report
    pub fn endpoint_data(&self, host: &str, endpoint: &str) -> Result<RequestHandle> {
        validate_host(host).map_err(|reason| ClientError::InvalidRequest(reason.to_string()))?;

        let call = ApiCall::endpoint_data(host, endpoint);
        let (host, endpoint) = (host.to_string(), endpoint.to_string());
        Ok(self.fetch(call, move |payload| ClientEvent::EndpointData {
            host,
            endpoint,
            payload,
        }))
    }

    fn fetch<F>(&self, call: ApiCall, to_event: F) -> RequestHandle
    where
        F: FnOnce(serde_json::Value) -> ClientEvent + Send + 'static,
    {
        let notifier = self.notifier.clone();
        let endpoint = call.endpoint;

        self.dispatcher.issue(call, move |result| {
            let event = match result.and_then(|response| decoder::decode_payload(&response)) {
                Ok(payload) => {
                    debug!(endpoint = endpoint.path(), "Received payload");
                    to_event(payload)
                }
                Err(error) => {
                    warn!(endpoint = endpoint.path(), "Request failed: {}", error);
                    ClientEvent::Failure {
                        generation: None,
                        error,
                    }
                }
            };
            notifier.emit(event);
        })
    }
}
