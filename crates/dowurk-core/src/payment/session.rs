//! Payment confirmation state machine.
//!
//! `PaymentSession` is the snapshot published by the poller after every
//! step. All transitions live here as plain methods so the state machine can
//! be exercised without timers or a gateway:
//!
//! ```text
//! checking --paid--------------> success
//! checking --expired-----------> expired
//! checking --transport failure-> error
//! checking --other--> (wait) --> checking, attempt + 1
//!                           \--> timeout when attempt reaches max_attempts
//! ```
//!
//! Terminal states absorb every further transition.

use std::time::Duration;

use dowurk_types::config::PollConfig;
use dowurk_types::error::GatewayError;
use dowurk_types::payment::{CheckoutStatus, PaymentFailure, PaymentStatus};
use serde::Serialize;

/// Snapshot of one payment confirmation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSession {
    /// Checkout session id from the processor redirect. Never changes.
    pub session_id: String,
    pub status: PaymentStatus,
    /// 0-based index of the current attempt.
    pub attempt: u32,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    /// Last successfully decoded status payload.
    pub details: Option<CheckoutStatus>,
    /// Set for every terminal status except `success`.
    pub failure: Option<PaymentFailure>,
}

impl PaymentSession {
    /// Start a run in `checking`, or straight in `error` when the id is blank.
    pub fn new(session_id: impl Into<String>, config: &PollConfig) -> Self {
        let session_id = session_id.into();
        let mut session = Self {
            session_id,
            status: PaymentStatus::Checking,
            attempt: 0,
            max_attempts: config.attempt_budget(),
            poll_interval: config.poll_interval(),
            details: None,
            failure: None,
        };
        if session.session_id.trim().is_empty() {
            session.fail(PaymentStatus::Error, PaymentFailure::MissingSessionId);
        }
        session
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Package name reported by the processor, if any.
    pub fn package_name(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.metadata.package_name.as_deref())
    }

    /// Apply a decoded status payload from the current attempt.
    ///
    /// `paid` wins over `expired` when a payload carries both.
    pub fn record_response(&mut self, response: CheckoutStatus) {
        if self.is_terminal() {
            return;
        }
        let paid = response.is_paid();
        let expired = response.is_expired();
        self.details = Some(response);

        if paid {
            self.status = PaymentStatus::Success;
        } else if expired {
            self.fail(PaymentStatus::Expired, PaymentFailure::Expired);
        }
    }

    /// Apply a transport failure from the current attempt. Fatal to the run.
    pub fn record_transport_failure(&mut self, error: &GatewayError) {
        if self.is_terminal() {
            return;
        }
        self.fail(
            PaymentStatus::Error,
            PaymentFailure::Transport(error.to_string()),
        );
    }

    /// Move to the next attempt after the poll interval has elapsed.
    ///
    /// Times the run out instead once the attempt budget is used up.
    pub fn advance(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            self.fail(PaymentStatus::Timeout, PaymentFailure::TimedOut);
        }
    }

    fn fail(&mut self, status: PaymentStatus, failure: PaymentFailure) {
        self.status = status;
        self.failure = Some(failure);
    }
}
