//! General "AI guide" chat.
//!
//! A lightweight conversation with no remote persistence: each request
//! carries a short window of the preceding turns and a topic hint instead of
//! a session id. Sends follow the same single-flight and fallback-reply rules
//! as the business assistant.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use dowurk_types::chat::{ChatMessage, ContextType, GuideReply, GuideRequest, HistoryEntry, MessageRole};
use dowurk_types::error::GatewayError;

use super::log::{ConversationLog, RejectReason, SendOutcome, TurnId};
use crate::gateway::BackendGateway;

/// First message shown in a new guide conversation.
pub const GUIDE_GREETING: &str = "Hello! I'm your DowUrk AI Guide. How can I help you today?";

/// Reply appended when the guide could not be reached.
pub const GUIDE_FALLBACK_REPLY: &str =
    "I'm having trouble right now. Please try again or contact support.";

/// Number of prior messages sent along with each request.
pub const HISTORY_WINDOW: usize = 6;

/// Canned prompts offered before the user types anything.
pub fn quick_actions() -> &'static [&'static str] {
    &["Find businesses", "Get AI help", "Find grants"]
}

#[derive(Debug)]
struct GuideState {
    log: ConversationLog,
    context_type: ContextType,
}

/// A general guide conversation.
pub struct GuideChatSession<G: BackendGateway> {
    gateway: Arc<G>,
    state: Mutex<GuideState>,
}

impl<G: BackendGateway> GuideChatSession<G> {
    /// Start a conversation seeded with the greeting.
    pub fn new(gateway: Arc<G>, context_type: ContextType) -> Self {
        Self {
            gateway,
            state: Mutex::new(GuideState {
                log: ConversationLog::with_greeting(GUIDE_GREETING),
                context_type,
            }),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().log.messages().to_vec()
    }

    pub fn is_pending(&self) -> bool {
        self.state().log.is_pending()
    }

    pub fn context_type(&self) -> ContextType {
        self.state().context_type
    }

    pub fn set_context_type(&self, context_type: ContextType) {
        self.state().context_type = context_type;
    }

    /// Send `text` to the guide.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let (turn, request) = match self.begin_turn(text) {
            Ok(opened) => opened,
            Err(reason) => {
                debug!(?reason, "guide send rejected");
                return SendOutcome::Rejected(reason);
            }
        };

        let result = self.gateway.send_guide_message(&request).await;
        self.complete_turn(turn, result)
    }

    /// Snapshot the history window, then optimistically append the message.
    fn begin_turn(&self, text: &str) -> Result<(TurnId, GuideRequest), RejectReason> {
        let mut state = self.state();
        let conversation_history: Vec<HistoryEntry> = state
            .log
            .tail(HISTORY_WINDOW)
            .iter()
            .map(HistoryEntry::from)
            .collect();
        let (turn, _) = state.log.begin_turn(text)?;

        Ok((
            turn,
            GuideRequest {
                message: text.to_string(),
                conversation_history,
                context_type: state.context_type,
            },
        ))
    }

    fn complete_turn(
        &self,
        turn: TurnId,
        result: Result<GuideReply, GatewayError>,
    ) -> SendOutcome {
        let outcome = match result {
            Ok(reply) => {
                SendOutcome::Replied(ChatMessage::local(MessageRole::Assistant, reply.response))
            }
            Err(e) => {
                warn!(error = %e, "guide request failed");
                SendOutcome::Degraded {
                    reply: ChatMessage::local(MessageRole::Assistant, GUIDE_FALLBACK_REPLY),
                    reason: e.to_string(),
                }
            }
        };

        if let Some(reply) = outcome.reply() {
            self.state().log.finish_turn(turn, reply.clone());
        }
        outcome
    }

    fn state(&self) -> MutexGuard<'_, GuideState> {
        self.state.lock().expect("guide state lock poisoned")
    }
}
