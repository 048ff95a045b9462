//! Span names and field values shared by the `dowurk` binary.
//!
//! Span names follow `"{area}.{operation}"`. All constants are string slices
//! usable as `tracing::info_span!` names or field values.

// --- Span names ---

/// One payment confirmation run, from redirect to terminal status.
pub const SPAN_PAYMENT_CONFIRM: &str = "payment.confirm";

/// An interactive business-assistant session.
pub const SPAN_ASSISTANT_SESSION: &str = "assistant.session";

/// A single business-assistant turn.
pub const SPAN_ASSISTANT_TURN: &str = "assistant.turn";

/// An interactive guide conversation.
pub const SPAN_GUIDE_SESSION: &str = "guide.session";

/// A single guide turn.
pub const SPAN_GUIDE_TURN: &str = "guide.turn";

// --- `outcome` field values ---

pub const OUTCOME_REPLIED: &str = "replied";
pub const OUTCOME_DEGRADED: &str = "degraded";
pub const OUTCOME_REJECTED: &str = "rejected";
