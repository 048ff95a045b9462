//! Assistant conversations.
//!
//! Two flavors share the same message log and single-flight rules:
//! [`assistant::ConversationSessionManager`] talks to the session-scoped
//! business assistant, [`guide::GuideChatSession`] to the stateless guide.

pub mod assistant;
pub mod guide;
pub mod log;

pub use assistant::{ClearOutcome, ConversationSessionManager, HistoryOutcome, PendingTurn};
pub use guide::GuideChatSession;
pub use log::{ConversationLog, RejectReason, SendOutcome, TurnClose, TurnId};
