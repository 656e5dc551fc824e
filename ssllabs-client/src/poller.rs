//! Assessment poller
//!
//! Drives one remote assessment to completion. Starting a session issues
//! the start call immediately and arms a repeating timer that re-issues the
//! poll call on every tick, without waiting for the previous request.
//! The first terminal outcome of the current session clears the timer and
//! emits exactly one terminal event; responses tagged with any other
//! generation are discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use ssllabs_core::domain::assessment::AssessmentRequest;
use ssllabs_core::dto::api::ApiCall;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::decoder::{self, PollOutcome};
use crate::dispatcher::{Dispatcher, RawResponse};
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventNotifier, Generation};

/// Polling state owned by the poller
///
/// Holds the only timer of the client. Dropping the session aborts it.
#[derive(Debug, Default)]
struct PollSession {
    timer: Option<JoinHandle<()>>,
    generation: Generation,
    active: bool,
}

impl PollSession {
    /// Clears the timer; a no-op when it is already cleared
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.active && self.generation == generation
    }

    /// Ends the session if `generation` is still the running one
    fn terminate(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.cancel_timer();
        self.active = false;
        true
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

struct PollerInner {
    dispatcher: Dispatcher,
    notifier: EventNotifier,
    poll_interval: Duration,
    session: Mutex<PollSession>,
}

impl PollerInner {
    fn session(&self) -> MutexGuard<'_, PollSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues `call` on behalf of `generation`
    fn issue(self: &Arc<Self>, generation: Generation, call: ApiCall) {
        let inner = Arc::clone(self);
        self.dispatcher
            .issue(call, move |result| inner.handle_outcome(generation, result));
    }

    fn handle_outcome(&self, generation: Generation, result: Result<RawResponse>) {
        let outcome = decoder::poll_outcome(result);
        let mut session = self.session();

        if !session.is_current(generation) {
            debug!(
                %generation,
                current = %session.generation,
                "Discarding response for a finished session"
            );
            return;
        }

        match outcome {
            PollOutcome::Continue(status) => {
                debug!(%generation, %status, "Assessment in progress");
                self.notifier
                    .emit(ClientEvent::Progress { generation, status });
            }
            PollOutcome::Ready(report) => {
                session.terminate(generation);
                info!(%generation, "Assessment complete");
                self.notifier
                    .emit(ClientEvent::Success { generation, report });
            }
            PollOutcome::Failed(error) => {
                session.terminate(generation);
                warn!(%generation, "Assessment failed: {}", error);
                self.notifier.emit(ClientEvent::Failure {
                    generation: Some(generation),
                    error,
                });
            }
        }
    }
}

/// Repeats the poll call until the session is no longer current
async fn run_timer(
    inner: Weak<PollerInner>,
    generation: Generation,
    call: ApiCall,
    period: Duration,
) {
    let Some(first_tick) = Instant::now().checked_add(period) else {
        if let Some(inner) = inner.upgrade() {
            let error = ClientError::Config(format!("poll interval {:?} is out of range", period));
            inner.handle_outcome(generation, Err(error));
        }
        return;
    };

    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !inner.session().is_current(generation) {
            break;
        }

        debug!(%generation, "Polling assessment status");
        inner.issue(generation, call.clone());
    }
}

/// Polling coordinator for assessment sessions
///
/// Clones share the same session.
#[derive(Clone)]
pub struct AssessmentPoller {
    inner: Arc<PollerInner>,
}

impl AssessmentPoller {
    /// Creates a new poller
    ///
    /// # Arguments
    /// * `dispatcher` - Issues the start and poll requests
    /// * `notifier` - Receives progress and terminal events
    /// * `poll_interval` - Time between poll ticks
    pub fn new(dispatcher: Dispatcher, notifier: EventNotifier, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                dispatcher,
                notifier,
                poll_interval,
                session: Mutex::new(PollSession::default()),
            }),
        }
    }

    /// Starts a new session for `request`
    ///
    /// Any running session is cancelled first; its pending responses are
    /// discarded when they arrive. Returns the generation of the new session.
    pub fn start(&self, request: &AssessmentRequest) -> Generation {
        let generation = {
            let mut session = self.inner.session();
            session.cancel_timer();
            session.generation = session.generation.next();
            session.active = true;

            // Armed before the start call goes out, so a fast terminal
            // outcome always finds the timer to clear.
            session.timer = Some(tokio::spawn(run_timer(
                Arc::downgrade(&self.inner),
                session.generation,
                request.poll_call(),
                self.inner.poll_interval,
            )));

            session.generation
        };

        info!(
            %generation,
            host = request.target_host(),
            "Starting assessment (poll interval: {:?})",
            self.inner.poll_interval
        );

        self.inner.issue(generation, request.start_call());
        generation
    }

    /// Cancels the running session without emitting an event
    ///
    /// Returns whether a session was running.
    pub fn stop(&self) -> bool {
        let mut session = self.inner.session();
        let generation = session.generation;
        let stopped = session.terminate(generation);
        if stopped {
            info!(%generation, "Assessment polling stopped");
        }
        stopped
    }

    /// Generation of the latest session (`0` before the first start)
    pub fn current_generation(&self) -> Generation {
        self.inner.session().generation
    }

    /// Whether a session is running
    pub fn is_polling(&self) -> bool {
        self.inner.session().active
    }

    /// Whether a poll timer is armed
    pub fn has_active_timer(&self) -> bool {
        self.inner
            .session()
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, ScriptedTransport};
    use ssllabs_core::domain::assessment::{CacheMode, ProgressStatus};
    use tokio::sync::broadcast::Receiver;
    use tokio::sync::broadcast::error::TryRecvError;

    const INTERVAL: Duration = Duration::from_secs(30);
    const TIMEOUT: Duration = Duration::from_secs(5);

    const DNS: &str = r#"{"status":"DNS"}"#;
    const IN_PROGRESS: &str = r#"{"status":"IN_PROGRESS"}"#;
    const READY: &str = r#"{"status":"READY","endpoints":[{"ipAddress":"1.2.3.4"}]}"#;

    fn poller_with(
        script: impl IntoIterator<Item = Scripted>,
        interval: Duration,
    ) -> (AssessmentPoller, Arc<ScriptedTransport>, Receiver<ClientEvent>) {
        let transport = ScriptedTransport::new(script);
        let notifier = EventNotifier::new(64);
        let rx = notifier.subscribe();
        let dispatcher = Dispatcher::new(transport.clone(), TIMEOUT);
        (
            AssessmentPoller::new(dispatcher, notifier, interval),
            transport,
            rx,
        )
    }

    fn request() -> AssessmentRequest {
        AssessmentRequest::new("example.com", CacheMode::None)
    }

    async fn next_terminal(rx: &mut Receiver<ClientEvent>) -> ClientEvent {
        loop {
            let event = rx.recv().await.unwrap();
            if event.is_terminal() {
                return event;
            }
        }
    }

    fn drain(rx: &mut Receiver<ClientEvent>) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return events,
                Err(e) => panic!("unexpected receive error: {:?}", e),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_then_ready() {
        let (poller, transport, mut rx) = poller_with(
            [
                Scripted::ok(DNS),
                Scripted::ok(IN_PROGRESS),
                Scripted::ok(IN_PROGRESS),
                Scripted::ok(READY),
            ],
            INTERVAL,
        );

        let generation = poller.start(&request());
        let mut progress = Vec::new();
        let terminal = loop {
            match rx.recv().await.unwrap() {
                ClientEvent::Progress { status, .. } => progress.push(status),
                event => break event,
            }
        };

        match terminal {
            ClientEvent::Success {
                generation: g,
                report,
            } => {
                assert_eq!(g, generation);
                assert_eq!(report.first_endpoint_ip(), Some("1.2.3.4"));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(
            progress,
            vec![
                ProgressStatus::Dns,
                ProgressStatus::InProgress,
                ProgressStatus::InProgress
            ]
        );
        assert!(!poller.has_active_timer());
        assert!(!poller.is_polling());

        // N transient responses + one READY = N + 1 requests, and nothing after
        time::sleep(INTERVAL * 4).await;
        assert_eq!(transport.call_count(), 4);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_call_then_poll_calls() {
        let (poller, transport, mut rx) = poller_with(
            [Scripted::ok(DNS), Scripted::ok(READY)],
            INTERVAL,
        );

        let request = AssessmentRequest::new("example.com", CacheMode::ForceNew);
        poller.start(&request);
        next_terminal(&mut rx).await;

        assert_eq!(
            transport.calls(),
            vec![request.start_call(), request.poll_call()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_error_terminates() {
        let (poller, transport, mut rx) = poller_with(
            [
                Scripted::ok(IN_PROGRESS),
                Scripted::ok(r#"{"status":"ERROR","statusMessage":"Unable to resolve domain name"}"#),
            ],
            INTERVAL,
        );

        let generation = poller.start(&request());

        match next_terminal(&mut rx).await {
            ClientEvent::Failure {
                generation: g,
                error,
            } => {
                assert_eq!(g, Some(generation));
                assert_eq!(
                    error,
                    ClientError::RemoteReported("Unable to resolve domain name".to_string())
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!poller.has_active_timer());

        time::sleep(INTERVAL * 3).await;
        assert_eq!(transport.call_count(), 2);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_body_fails_session() {
        let (poller, _transport, mut rx) = poller_with(
            [Scripted::ok(""), Scripted::ok(READY)],
            INTERVAL,
        );

        poller.start(&request());

        match next_terminal(&mut rx).await {
            ClientEvent::Failure { error, .. } => {
                assert_eq!(error, ClientError::protocol("No Response Body Received"));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        time::sleep(INTERVAL * 3).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_terminates() {
        let (poller, transport, mut rx) = poller_with(
            [Scripted::ok(DNS), Scripted::fail("connection reset by peer")],
            INTERVAL,
        );

        poller.start(&request());

        match next_terminal(&mut rx).await {
            ClientEvent::Failure { error, .. } => assert!(error.is_transport()),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!poller.has_active_timer());

        time::sleep(INTERVAL * 3).await;
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_single_error() {
        let (poller, transport, mut rx) = poller_with(
            [Scripted::ok(READY).after(TIMEOUT * 2)],
            INTERVAL,
        );

        poller.start(&request());

        match next_terminal(&mut rx).await {
            ClientEvent::Failure { error, .. } => assert!(error.is_transport()),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!poller.has_active_timer());

        time::sleep(INTERVAL * 3).await;
        assert_eq!(transport.call_count(), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_leaves_one_timer() {
        let (poller, transport, mut rx) = poller_with([], INTERVAL);

        let first = poller.start(&request());
        let second = poller.start(&request());

        assert!(second > first);
        assert_eq!(poller.current_generation(), second);
        assert!(poller.has_active_timer());

        // Two start calls, then one tick per interval from a single timer
        time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;
        assert_eq!(transport.call_count(), 5);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.generation() == Some(second)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_discarded() {
        let (poller, _transport, mut rx) = poller_with(
            [
                // First session's start call answers late
                Scripted::ok(READY).after(Duration::from_secs(4)),
                Scripted::ok(IN_PROGRESS).after(Duration::from_secs(1)),
                Scripted::ok(READY),
            ],
            INTERVAL,
        );

        let first = poller.start(&request());
        let second = poller.start(&request());
        assert_ne!(first, second);

        let events = {
            let mut events = Vec::new();
            loop {
                let event = rx.recv().await.unwrap();
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    break events;
                }
            }
        };

        assert!(events.iter().all(|e| e.generation() == Some(second)));
        assert!(matches!(events.last(), Some(ClientEvent::Success { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_requests_emit_one_terminal() {
        // Interval shorter than the response time, so requests overlap
        let (poller, transport, mut rx) = poller_with(
            [
                Scripted::ok(READY).after(Duration::from_millis(2500)),
                Scripted::ok(READY),
                Scripted::ok(READY),
            ],
            Duration::from_secs(1),
        );

        let generation = poller.start(&request());

        let terminal = next_terminal(&mut rx).await;
        assert_eq!(terminal.generation(), Some(generation));

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.call_count(), 2);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_terminal_is_ignored() {
        let (poller, _transport, mut rx) = poller_with([], INTERVAL);
        let generation = poller.start(&request());
        // Let the start call land
        time::sleep(Duration::from_secs(1)).await;
        drain(&mut rx);

        let error = r#"{"status":"ERROR","statusMessage":"boom"}"#;
        poller
            .inner
            .handle_outcome(generation, Ok(RawResponse::new(200, error)));
        poller
            .inner
            .handle_outcome(generation, Ok(RawResponse::new(200, error)));
        poller
            .inner
            .handle_outcome(generation, Ok(RawResponse::new(200, READY)));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_without_event() {
        let (poller, transport, mut rx) = poller_with(
            [Scripted::ok(DNS).after(Duration::from_secs(2))],
            INTERVAL,
        );

        poller.start(&request());
        assert!(poller.stop());
        assert!(!poller.stop());
        assert!(!poller.has_active_timer());

        time::sleep(INTERVAL * 3).await;
        assert_eq!(transport.call_count(), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_termination() {
        let (poller, _transport, mut rx) = poller_with(
            [
                Scripted::ok(r#"{"status":"ERROR","statusMessage":"boom"}"#),
                Scripted::ok(READY),
            ],
            INTERVAL,
        );

        let first = poller.start(&request());
        assert!(matches!(
            next_terminal(&mut rx).await,
            ClientEvent::Failure { .. }
        ));

        let second = poller.start(&request());
        match next_terminal(&mut rx).await {
            ClientEvent::Success { generation, .. } => assert_eq!(generation, second),
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(second.value(), first.value() + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_interval_fails_session() {
        let (poller, _transport, mut rx) = poller_with([], Duration::MAX);

        let generation = poller.start(&request());

        match next_terminal(&mut rx).await {
            ClientEvent::Failure {
                generation: g,
                error,
            } => {
                assert_eq!(g, Some(generation));
                assert!(matches!(error, ClientError::Config(_)));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!poller.is_polling());
        assert!(!poller.has_active_timer());

        time::sleep(INTERVAL).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_poller_aborts_timer() {
        let (poller, transport, _rx) = poller_with([Scripted::ok(DNS)], INTERVAL);

        poller.start(&request());
        time::sleep(Duration::from_secs(1)).await;
        drop(poller);

        time::sleep(INTERVAL * 3).await;
        assert_eq!(transport.call_count(), 1);
    }
}
