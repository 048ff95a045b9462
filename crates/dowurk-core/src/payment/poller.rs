//! Bounded-retry payment confirmation poller.
//!
//! After the checkout redirect the processor may not have settled yet, so the
//! poller asks the backend for the session status up to `max_attempts` times,
//! `poll_interval` apart, until a terminal status is reached. A transport
//! failure ends the run immediately; it is never retried.
//!
//! Each run is a spawned task driven by a [`CancellationToken`]. The returned
//! [`PollHandle`] streams every snapshot and cancels the run when aborted or
//! dropped, so a torn-down view can never be updated by an orphaned attempt.

use std::sync::Arc;

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use dowurk_types::config::PollConfig;
use dowurk_types::payment::PaymentStatus;

use super::session::PaymentSession;
use crate::gateway::BackendGateway;
use crate::store::{SessionStore, load_user, save_user};

/// Polls the backend until a checkout session reaches a terminal status.
pub struct PaymentConfirmationPoller<G: BackendGateway, S: SessionStore> {
    gateway: Arc<G>,
    store: Arc<S>,
    config: PollConfig,
}

impl<G, S> PaymentConfirmationPoller<G, S>
where
    G: BackendGateway + 'static,
    S: SessionStore + 'static,
{
    pub fn new(gateway: Arc<G>, store: Arc<S>, config: PollConfig) -> Self {
        Self {
            gateway,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Spawn a polling run for `session_id` on the current runtime.
    pub fn start(&self, session_id: impl Into<String>) -> PollHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let gateway = Arc::clone(&self.gateway);
        let store = Arc::clone(&self.store);
        let config = self.config.clone();
        let session_id = session_id.into();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            poll_until_terminal(
                gateway.as_ref(),
                store.as_ref(),
                &config,
                session_id,
                &token,
                |snapshot| {
                    // The receiver may be gone; the run still finishes cleanly.
                    let _ = tx.send(snapshot.clone());
                },
            )
            .await
        });

        PollHandle {
            snapshots: rx,
            guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    /// Drive a polling run inline, reporting each snapshot to `on_snapshot`.
    ///
    /// Returns `None` when `cancel` fired before a terminal status.
    pub async fn run(
        &self,
        session_id: impl Into<String>,
        cancel: &CancellationToken,
        on_snapshot: impl FnMut(&PaymentSession),
    ) -> Option<PaymentSession> {
        poll_until_terminal(
            self.gateway.as_ref(),
            self.store.as_ref(),
            &self.config,
            session_id.into(),
            cancel,
            on_snapshot,
        )
        .await
    }
}

/// Handle to a spawned polling run.
///
/// Dropping the handle aborts the run.
pub struct PollHandle {
    snapshots: mpsc::UnboundedReceiver<PaymentSession>,
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Option<PaymentSession>>,
}

impl PollHandle {
    /// Cancel the pending timer or in-flight request. Idempotent.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Next published snapshot, or `None` once the run has ended.
    pub async fn next_snapshot(&mut self) -> Option<PaymentSession> {
        self.snapshots.recv().await
    }

    /// Every snapshot in order: the initial `checking` state, one per
    /// attempt, and the terminal state last.
    pub fn snapshots(&mut self) -> impl Stream<Item = PaymentSession> + '_ {
        futures_util::stream::poll_fn(move |cx| self.snapshots.poll_recv(cx))
    }

    /// Wait for the run to finish. `None` if it was aborted.
    pub async fn wait(self) -> Option<PaymentSession> {
        let PollHandle { task, guard, .. } = self;
        let outcome = task.await;
        drop(guard);
        match outcome {
            Ok(final_state) => final_state,
            Err(e) => {
                warn!(error = %e, "payment polling task failed");
                None
            }
        }
    }
}

async fn poll_until_terminal<G, S, F>(
    gateway: &G,
    store: &S,
    config: &PollConfig,
    session_id: String,
    cancel: &CancellationToken,
    mut publish: F,
) -> Option<PaymentSession>
where
    G: BackendGateway,
    S: SessionStore,
    F: FnMut(&PaymentSession),
{
    let mut session = PaymentSession::new(session_id, config);
    publish(&session);
    if session.is_terminal() {
        warn!("payment confirmation started without a session id");
        return Some(session);
    }

    info!(
        session_id = %session.session_id,
        max_attempts = session.max_attempts,
        "Polling payment status"
    );

    loop {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(session_id = %session.session_id, "payment polling aborted");
                return None;
            }
            response = gateway.checkout_status(&session.session_id) => response,
        };

        match response {
            Ok(status) => {
                debug!(
                    session_id = %session.session_id,
                    attempt = session.attempt,
                    payment_status = %status.payment_status,
                    status = %status.status,
                    "payment status received"
                );
                session.record_response(status);
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id,
                    attempt = session.attempt,
                    error = %e,
                    "payment status request failed"
                );
                session.record_transport_failure(&e);
            }
        }

        if session.status == PaymentStatus::Success {
            apply_package_role(store, &session).await;
        }

        publish(&session);
        if session.is_terminal() {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(session_id = %session.session_id, "payment polling aborted");
                return None;
            }
            _ = tokio::time::sleep(session.poll_interval) => {}
        }

        session.advance();
        if session.is_terminal() {
            publish(&session);
            break;
        }
    }

    info!(
        session_id = %session.session_id,
        status = %session.status,
        attempt = session.attempt,
        "Payment confirmation finished"
    );
    Some(session)
}

/// Record the purchased package as the local user's role.
///
/// Best-effort: a missing record or a store failure is logged and ignored.
async fn apply_package_role<S: SessionStore>(store: &S, session: &PaymentSession) {
    let Some(package_id) = session
        .details
        .as_ref()
        .and_then(|d| d.metadata.package_id.clone())
    else {
        return;
    };

    match load_user(store).await {
        Ok(Some(mut user)) => {
            user.role = Some(package_id.clone());
            match save_user(store, &user).await {
                Ok(()) => info!(role = %package_id, "Local user record updated"),
                Err(e) => warn!(error = %e, "failed to update local user record"),
            }
        }
        Ok(None) => debug!("no local user record, skipping role update"),
        Err(e) => warn!(error = %e, "failed to read local user record"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGateway, MockStore, expired, http_500, paid, pending};
    use dowurk_types::payment::PaymentFailure;
    use dowurk_types::user::USER_RECORD_KEY;
    use futures_util::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    fn build_poller(
        gateway: MockGateway,
        store: MockStore,
    ) -> (PaymentConfirmationPoller<MockGateway, MockStore>, Arc<MockGateway>, Arc<MockStore>) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(store);
        let poller = PaymentConfirmationPoller::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            PollConfig::default(),
        );
        (poller, gateway, store)
    }

    fn assert_spaced(calls: &[tokio::time::Instant]) {
        for pair in calls.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_millis(2_000),
                "requests must be at least one poll interval apart"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_paid_on_attempt_k_takes_exactly_k_requests() {
        for k in 1..=5usize {
            let mut script = vec![Ok(pending()); k - 1];
            script.push(Ok(paid("pro")));
            let (poller, gateway, _) = build_poller(MockGateway::new().with_checkout(script), MockStore::default());

            let final_state = poller.start("sess_k").wait().await.unwrap();
            assert_eq!(final_state.status, PaymentStatus::Success, "k = {k}");
            assert_eq!(final_state.attempt as usize, k - 1);

            tokio::time::sleep(Duration::from_secs(60)).await;
            let calls = gateway.checkout_calls();
            assert_eq!(calls.len(), k, "no request after success (k = {k})");
            assert_spaced(&calls);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_times_out_after_max_attempts() {
        let (poller, gateway, _) = build_poller(MockGateway::new(), MockStore::default());

        let final_state = poller.start("sess_slow").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Timeout);
        assert_eq!(final_state.failure, Some(PaymentFailure::TimedOut));

        tokio::time::sleep(Duration::from_secs(60)).await;
        let calls = gateway.checkout_calls();
        assert_eq!(calls.len(), 5, "no sixth request");
        assert_spaced(&calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempt_config_sends_exactly_one_request() {
        let gateway = Arc::new(MockGateway::new());
        let config = PollConfig {
            max_attempts: 0,
            ..PollConfig::default()
        };
        let poller =
            PaymentConfirmationPoller::new(Arc::clone(&gateway), Arc::new(MockStore::default()), config);

        let final_state = poller.start("sess_zero").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Timeout);
        assert_eq!(final_state.max_attempts, 1);
        assert_eq!(gateway.checkout_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_session_id_errors_without_requests() {
        let (poller, gateway, _) = build_poller(MockGateway::new(), MockStore::default());

        let final_state = poller.start("").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Error);
        assert_eq!(final_state.failure, Some(PaymentFailure::MissingSessionId));
        assert!(gateway.checkout_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_not_retried() {
        let script = vec![Ok(pending()), Err(http_500())];
        let (poller, gateway, _) = build_poller(MockGateway::new().with_checkout(script), MockStore::default());

        let final_state = poller.start("sess_err").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Error);
        assert!(matches!(final_state.failure, Some(PaymentFailure::Transport(_))));
        // Details from the last good response are kept.
        assert_eq!(final_state.details, Some(pending()));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.checkout_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_stops_polling() {
        let (poller, gateway, _) = build_poller(
            MockGateway::new().with_checkout(vec![Ok(expired())]),
            MockStore::default(),
        );

        let final_state = poller.start("sess_old").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Expired);
        assert_eq!(gateway.checkout_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paid_after_two_pending_patches_user_role() {
        let script = vec![Ok(pending()), Ok(pending()), Ok(paid("pro"))];
        let store = MockStore::with_user(json!({"email": "ana@example.com", "role": "free"}));
        let (poller, gateway, store) = build_poller(MockGateway::new().with_checkout(script), store);

        let final_state = poller.start("sess_123").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Success);
        assert_eq!(gateway.checkout_calls().len(), 3);

        let user = store.value(USER_RECORD_KEY).unwrap();
        assert_eq!(user["role"], "pro");
        assert_eq!(user["email"], "ana@example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paid_without_local_user_creates_no_record() {
        let (poller, _, store) = build_poller(
            MockGateway::new().with_checkout(vec![Ok(paid("pro"))]),
            MockStore::default(),
        );

        let final_state = poller.start("sess_anon").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Success);
        assert!(store.value(USER_RECORD_KEY).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_update_failure_does_not_fail_the_run() {
        let store = MockStore::with_user(json!({"role": "free"})).failing_writes();
        let (poller, _, store) = build_poller(MockGateway::new().with_checkout(vec![Ok(paid("pro"))]), store);

        let final_state = poller.start("sess_123").wait().await.unwrap();
        assert_eq!(final_state.status, PaymentStatus::Success);
        assert_eq!(store.value(USER_RECORD_KEY).unwrap()["role"], "free");
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_stream_ends_with_terminal_state() {
        let script = vec![Ok(pending()), Ok(paid("pro"))];
        let (poller, _, _) = build_poller(MockGateway::new().with_checkout(script), MockStore::default());

        let mut handle = poller.start("sess_stream");
        let snapshots: Vec<PaymentSession> = handle.snapshots().collect().await;
        let statuses: Vec<(PaymentStatus, u32)> =
            snapshots.iter().map(|s| (s.status, s.attempt)).collect();

        assert_eq!(
            statuses,
            vec![
                (PaymentStatus::Checking, 0),
                (PaymentStatus::Checking, 0),
                (PaymentStatus::Success, 1),
            ]
        );
        assert!(snapshots[0].details.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_stops_further_requests() {
        let (poller, gateway, _) = build_poller(MockGateway::new(), MockStore::default());

        let mut handle = poller.start("sess_abort");
        // Initial state, then the first attempt's response.
        handle.next_snapshot().await.unwrap();
        handle.next_snapshot().await.unwrap();
        handle.abort();
        assert!(handle.is_aborted());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.checkout_calls().len(), 1);
        assert!(handle.next_snapshot().await.is_none());
        assert!(handle.wait().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_aborts_run() {
        let (poller, gateway, _) = build_poller(MockGateway::new(), MockStore::default());

        let mut handle = poller.start("sess_drop");
        handle.next_snapshot().await.unwrap();
        handle.next_snapshot().await.unwrap();
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.checkout_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_inline_reports_snapshots() {
        let (poller, _, _) = build_poller(
            MockGateway::new().with_checkout(vec![Ok(expired())]),
            MockStore::default(),
        );

        let mut seen = Vec::new();
        let cancel = CancellationToken::new();
        let final_state = poller
            .run("sess_inline", &cancel, |s| seen.push(s.status))
            .await
            .unwrap();

        assert_eq!(final_state.status, PaymentStatus::Expired);
        assert_eq!(seen, vec![PaymentStatus::Checking, PaymentStatus::Expired]);
    }
}
