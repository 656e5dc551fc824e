//! Request dispatcher
//!
//! Issues single GET requests with a bounded timeout and delivers exactly
//! one outcome per request to a callback. Timeouts and explicit aborts are
//! reported as transport errors through that same callback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use ssllabs_core::dto::api::ApiCall;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// A completed HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one request against the API
///
/// Implementations do not apply timeouts themselves; the [`Dispatcher`]
/// bounds every call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, call: &ApiCall) -> Result<RawResponse>;
}

/// reqwest implementation of [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self::with_client(config.api_base_url.clone(), client))
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, call: &ApiCall) -> Result<RawResponse> {
        let url = format!("{}/{}", self.base_url, call.endpoint.path());
        let response = self.client.get(&url).query(&call.query).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Handle to one in-flight request
pub struct RequestHandle {
    abort: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RequestHandle {
    /// Aborts the request
    ///
    /// The callback still fires once, with a transport error. Aborting a
    /// request that already completed does nothing. Dropping the handle
    /// does not abort.
    pub fn abort(&mut self) {
        if let Some(abort) = self.abort.take() {
            let _ = abort.send(());
        }
    }

    /// Waits until the outcome has been delivered
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            warn!("Request task failed: {}", e);
        }
    }
}

/// Issues bounded-timeout requests through a [`Transport`]
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Issues `call` and hands its outcome to `on_outcome`
    ///
    /// `on_outcome` runs exactly once: with the response, or with a
    /// transport error if the request failed, timed out or was aborted.
    pub fn issue<F>(&self, call: ApiCall, on_outcome: F) -> RequestHandle
    where
        F: FnOnce(Result<RawResponse>) + Send + 'static,
    {
        let (abort_tx, abort_rx) = oneshot::channel::<()>();
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;

        debug!(%call, "Issuing request");

        let task = tokio::spawn(async move {
            let outcome = tokio::select! {
                result = tokio::time::timeout(timeout, transport.get(&call)) => match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(%call, "Request timed out after {:?}, aborting", timeout);
                        Err(ClientError::transport(format!(
                            "request aborted after {:?} timeout",
                            timeout
                        )))
                    }
                },
                Ok(()) = abort_rx => {
                    debug!(%call, "Request aborted");
                    Err(ClientError::transport("request aborted"))
                }
            };

            on_outcome(outcome);
        });

        RequestHandle {
            abort: Some(abort_tx),
            task,
        }
    }
}
