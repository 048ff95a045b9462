//! Business-planning assistant session manager.
//!
//! Owns one conversation's ordered message log, persists and retrieves it
//! through the backend, and mediates optimistic local updates against the
//! asynchronous assistant reply. No operation here returns an error to the
//! caller: history loads are best-effort, sends always end with exactly one
//! assistant message, and clearing always empties the local log.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use dowurk_types::chat::{AssistantReply, AssistantRequest, ChatMessage, MessageRole, SessionId};
use dowurk_types::error::GatewayError;

use super::log::{ConversationLog, RejectReason, SendOutcome, TurnClose, TurnId};
use crate::gateway::BackendGateway;

/// Reply appended when the assistant could not be reached.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Question put to the user before history is cleared.
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear the chat history?";

/// Result of [`ConversationSessionManager::load_history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The local log was replaced with `count` remote messages.
    Loaded { count: usize },
    /// The load failed; the local log was left untouched.
    Failed { reason: String },
    /// A send was in flight or finished while the request was out, so the
    /// log was not replaced.
    Skipped,
}

/// Result of [`ConversationSessionManager::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The user said no; nothing changed and no request was made.
    Declined,
    /// The local log is empty. `remote_deleted` reports the DELETE result.
    Cleared { remote_deleted: bool },
}

/// A turn opened by [`ConversationSessionManager::begin_turn`].
///
/// Must be handed back to [`ConversationSessionManager::complete_turn`];
/// the session stays pending until it is.
#[must_use = "a pending turn keeps the session locked until completed"]
#[derive(Debug)]
pub struct PendingTurn {
    pub user_message: ChatMessage,
    pub request: AssistantRequest,
    turn: TurnId,
}

#[derive(Debug, Default)]
struct SessionState {
    log: ConversationLog,
    context: Option<String>,
}

/// Manages one business-assistant conversation.
///
/// Methods take `&self`, so one manager can be shared between the input
/// loop and background tasks; the internal lock is never held across an
/// `.await`.
pub struct ConversationSessionManager<G: BackendGateway> {
    gateway: Arc<G>,
    session_id: SessionId,
    state: Mutex<SessionState>,
}

impl<G: BackendGateway> ConversationSessionManager<G> {
    /// Create a manager with a freshly generated session id.
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_session_id(gateway, SessionId::generate())
    }

    /// Create a manager bound to an existing session id.
    pub fn with_session_id(gateway: Arc<G>, session_id: SessionId) -> Self {
        Self {
            gateway,
            session_id,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Snapshot of the message log, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().log.messages().to_vec()
    }

    pub fn is_pending(&self) -> bool {
        self.state().log.is_pending()
    }

    pub fn context(&self) -> Option<String> {
        self.state().context.clone()
    }

    /// Replace the business context sent with later messages.
    ///
    /// Blank text clears it.
    pub fn set_context(&self, context: Option<String>) {
        self.state().context = normalize_context(context);
    }

    /// Fetch the remote history and replace the local log with it.
    ///
    /// Skipped when a send is open now or ran while the request was out.
    pub async fn load_history(&self) -> HistoryOutcome {
        let revision = self.state().log.revision();
        let result = self.gateway.chat_history(self.session_id.as_str()).await;

        let mut state = self.state();
        match result {
            Ok(_) if state.log.is_pending() || state.log.revision() != revision => {
                debug!(session_id = %self.session_id, "conversation changed during load, keeping local history");
                HistoryOutcome::Skipped
            }
            Ok(messages) => {
                let count = messages.len();
                state.log.replace(messages);
                debug!(session_id = %self.session_id, count, "chat history loaded");
                HistoryOutcome::Loaded { count }
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "failed to load chat history");
                HistoryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Send `text` with the session's current business context.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let context = self.context();
        self.send_with_context(text, context).await
    }

    /// Send `text` with `context` for this turn only.
    pub async fn send_with_context(&self, text: &str, context: Option<String>) -> SendOutcome {
        let turn = match self.begin_turn_with_context(text, context) {
            Ok(turn) => turn,
            Err(reason) => {
                debug!(session_id = %self.session_id, ?reason, "send rejected");
                return SendOutcome::Rejected(reason);
            }
        };

        let result = self.gateway.send_business_message(&turn.request).await;
        self.complete_turn(turn, result)
    }

    /// Step one of a send: optimistic append of the user message.
    pub fn begin_turn(&self, text: &str) -> Result<PendingTurn, RejectReason> {
        let context = self.context();
        self.begin_turn_with_context(text, context)
    }

    fn begin_turn_with_context(
        &self,
        text: &str,
        context: Option<String>,
    ) -> Result<PendingTurn, RejectReason> {
        let (turn, user_message) = self.state().log.begin_turn(text)?;
        let request = AssistantRequest {
            session_id: self.session_id.to_string(),
            user_message: text.to_string(),
            business_context: normalize_context(context),
        };
        Ok(PendingTurn {
            user_message,
            request,
            turn,
        })
    }

    /// Step two of a send: reconcile the open turn with the remote result.
    ///
    /// Appends exactly one assistant message and clears `pending`, unless the
    /// log was cleared meanwhile, in which case the reply is dropped.
    pub fn complete_turn(
        &self,
        turn: PendingTurn,
        result: Result<AssistantReply, GatewayError>,
    ) -> SendOutcome {
        let outcome = match result {
            Ok(reply) => SendOutcome::Replied(ChatMessage::assistant_at(
                reply.assistant_response,
                reply.timestamp,
            )),
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "assistant request failed");
                SendOutcome::Degraded {
                    reply: ChatMessage::local(MessageRole::Assistant, FALLBACK_REPLY),
                    reason: e.to_string(),
                }
            }
        };

        let Some(reply) = outcome.reply().cloned() else {
            return outcome;
        };
        match self.state().log.finish_turn(turn.turn, reply.clone()) {
            TurnClose::Appended => outcome,
            TurnClose::Discarded => {
                debug!(session_id = %self.session_id, "history cleared during send, dropping reply");
                SendOutcome::Discarded { reply }
            }
            TurnClose::Stale => {
                warn!(session_id = %self.session_id, "turn is not open on this session");
                SendOutcome::Rejected(RejectReason::Stale)
            }
        }
    }

    /// Clear the conversation after the user confirms.
    ///
    /// The remote delete is fire-and-forget: the local log is emptied
    /// whether or not it succeeds. A send still in flight keeps the session
    /// pending, but its reply is dropped.
    pub async fn clear<F>(&self, confirm: F) -> ClearOutcome
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CLEAR_PROMPT) {
            return ClearOutcome::Declined;
        }

        let remote_deleted = match self
            .gateway
            .clear_chat_history(self.session_id.as_str())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "failed to clear remote chat history");
                false
            }
        };

        self.state().log.clear();
        info!(session_id = %self.session_id, remote_deleted, "Chat history cleared");
        ClearOutcome::Cleared { remote_deleted }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("conversation state lock poisoned")
    }
}

fn normalize_context(context: Option<String>) -> Option<String> {
    context.filter(|c| !c.trim().is_empty())
}
