//! Scripted transport used by the unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ssllabs_core::dto::api::ApiCall;

use crate::dispatcher::{RawResponse, Transport};
use crate::error::{ClientError, Result};

/// One scripted reply
#[derive(Debug, Clone)]
pub struct Scripted {
    delay: Duration,
    outcome: Result<RawResponse>,
}

impl Scripted {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(RawResponse::new(status, body)),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(ClientError::transport(message)),
        }
    }

    /// Delays the reply
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replies to calls in order; answers IN_PROGRESS once the script runs out
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Calls received so far, in arrival order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, call: &ApiCall) -> Result<RawResponse> {
        self.calls.lock().unwrap().push(call.clone());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::ok(r#"{"status":"IN_PROGRESS"}"#));

        if !next.delay.is_zero() {
            tokio::time::sleep(next.delay).await;
        }
        next.outcome
    }
}
