//! Checkout/payment status types.
//!
//! `CheckoutStatus` is the wire payload of the payment-status endpoint.
//! `PaymentStatus` and `PaymentFailure` describe where a confirmation run
//! ended up and what the user should do about it.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// Processor-reported payment status meaning the checkout settled.
pub const PAYMENT_STATUS_PAID: &str = "paid";

/// Processor-reported session status meaning the checkout can no longer complete.
pub const SESSION_STATUS_EXPIRED: &str = "expired";

/// Client-observed status of a payment confirmation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Checking,
    Success,
    Expired,
    Timeout,
    Error,
}

impl PaymentStatus {
    /// Whether no further transitions (and no further requests) can occur.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Checking)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Checking => write!(f, "checking"),
            PaymentStatus::Success => write!(f, "success"),
            PaymentStatus::Expired => write!(f, "expired"),
            PaymentStatus::Timeout => write!(f, "timeout"),
            PaymentStatus::Error => write!(f, "error"),
        }
    }
}

/// Processor metadata attached to a checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// Any other metadata the processor returned (e.g. `user_email`).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Response body of `GET /api/payments/checkout/status/{session_id}`.
///
/// Every field defaults when absent so a partial payload still decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutStatus {
    /// `initiated`, `paid`, `failed`, `expired`, ...
    #[serde(default)]
    pub payment_status: String,
    /// `open`, `complete`, `expired`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: CheckoutMetadata,
}

impl CheckoutStatus {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PAYMENT_STATUS_PAID
    }

    pub fn is_expired(&self) -> bool {
        self.status == SESSION_STATUS_EXPIRED
    }
}

/// What the user should do after a failed confirmation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    /// Start a new checkout; this one can no longer settle.
    RetryCheckout,
    /// The payment may still settle; a confirmation email will follow.
    CheckEmail,
    /// Something is wrong on the client or network side.
    ContactSupport,
}

/// Cause attached to a terminal non-success payment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PaymentFailure {
    MissingSessionId,
    Transport(String),
    Expired,
    TimedOut,
}

impl PaymentFailure {
    /// The message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            PaymentFailure::MissingSessionId => "No session ID found",
            PaymentFailure::Transport(_) => "Error verifying payment. Please contact support.",
            PaymentFailure::Expired => "Payment session expired. Please try again.",
            PaymentFailure::TimedOut => {
                "Payment verification timed out. Please check your email for confirmation."
            }
        }
    }

    pub fn remedy(&self) -> Remedy {
        match self {
            PaymentFailure::Expired => Remedy::RetryCheckout,
            PaymentFailure::TimedOut => Remedy::CheckEmail,
            PaymentFailure::MissingSessionId | PaymentFailure::Transport(_) => {
                Remedy::ContactSupport
            }
        }
    }
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentFailure::Transport(cause) => write!(f, "{} ({cause})", self.user_message()),
            _ => f.write_str(self.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_checking_is_non_terminal() {
        assert!(!PaymentStatus::Checking.is_terminal());
        for status in [
            PaymentStatus::Success,
            PaymentStatus::Expired,
            PaymentStatus::Timeout,
            PaymentStatus::Error,
        ] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
    }

    #[test]
    fn test_checkout_status_decodes_partial_payload() {
        let status: CheckoutStatus = serde_json::from_str(r#"{"payment_status":"pending"}"#).unwrap();
        assert!(!status.is_paid());
        assert!(!status.is_expired());
        assert!(status.metadata.package_id.is_none());
    }

    #[test]
    fn test_checkout_status_keeps_extra_metadata() {
        let json = r#"{
            "payment_status": "paid",
            "status": "complete",
            "metadata": {"package_id": "pro", "package_name": "Professional", "user_email": "a@b.c"}
        }"#;
        let status: CheckoutStatus = serde_json::from_str(json).unwrap();
        assert!(status.is_paid());
        assert_eq!(status.metadata.package_id.as_deref(), Some("pro"));
        assert_eq!(status.metadata.package_name.as_deref(), Some("Professional"));
        assert_eq!(status.metadata.extra["user_email"], "a@b.c");
    }

    #[test]
    fn test_failure_remedies_are_distinct() {
        assert_eq!(PaymentFailure::Expired.remedy(), Remedy::RetryCheckout);
        assert_eq!(PaymentFailure::TimedOut.remedy(), Remedy::CheckEmail);
        assert_eq!(
            PaymentFailure::Transport("HTTP 500".into()).remedy(),
            Remedy::ContactSupport
        );
        assert_eq!(PaymentFailure::MissingSessionId.remedy(), Remedy::ContactSupport);
    }

    #[test]
    fn test_payment_status_serde_lowercase() {
        let json = serde_json::to_string(&PaymentStatus::Timeout).unwrap();
        assert_eq!(json, "\"timeout\"");
    }
}
