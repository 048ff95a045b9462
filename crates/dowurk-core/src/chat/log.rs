//! Ordered message log with a single-flight send guard.
//!
//! Shared by both assistant conversations. The log only ever grows by
//! appending, except for `replace`/`clear`, which swap the whole sequence at
//! once. While a turn is open (`pending`), no second turn can start, so every
//! assistant reply lands directly after the user message that caused it.
//! A reply whose user message was swept away by `replace`/`clear` is dropped
//! rather than appended to the new sequence.

use dowurk_types::chat::{ChatMessage, MessageRole};

/// Why a send was refused before anything was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The text was empty or whitespace only.
    Empty,
    /// Another send for this session is still in flight.
    InFlight,
    /// The turn being completed is not the one open on this log.
    Stale,
}

/// Result of a send. Never an error: failures become a fallback reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was appended and `pending` was not touched.
    Rejected(RejectReason),
    /// The assistant answered; this is the appended reply.
    Replied(ChatMessage),
    /// The request failed; `reply` is the appended fallback message.
    Degraded { reply: ChatMessage, reason: String },
    /// The log was cleared while the request was in flight. `reply` was
    /// dropped and the turn is closed.
    Discarded { reply: ChatMessage },
}

impl SendOutcome {
    /// The assistant message appended by this send, if any.
    pub fn reply(&self) -> Option<&ChatMessage> {
        match self {
            SendOutcome::Rejected(_) | SendOutcome::Discarded { .. } => None,
            SendOutcome::Replied(reply) | SendOutcome::Degraded { reply, .. } => Some(reply),
        }
    }
}

/// Handle for the turn opened by [`ConversationLog::begin_turn`].
///
/// Not `Clone`: a turn is finished at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct TurnId(u64);

/// What [`ConversationLog::finish_turn`] did with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnClose {
    /// The reply was appended after its user message.
    Appended,
    /// The user message had been cleared; the reply was dropped.
    Discarded,
    /// The id did not match the open turn; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct OpenTurn {
    id: u64,
    swept: bool,
}

/// Ordered conversation log plus the in-flight turn.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
    open: Option<OpenTurn>,
    next_turn: u64,
    revision: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that starts with a single assistant greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: vec![ChatMessage::local(MessageRole::Assistant, greeting)],
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.open.is_some()
    }

    /// Bumped by every change to the sequence or the open turn.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The last `n` messages, oldest first.
    pub fn tail(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Open a turn: optimistically append the user's message and mark the
    /// log pending.
    ///
    /// `text` is stored untrimmed; only the emptiness check trims.
    pub fn begin_turn(&mut self, text: &str) -> Result<(TurnId, ChatMessage), RejectReason> {
        if text.trim().is_empty() {
            return Err(RejectReason::Empty);
        }
        if self.open.is_some() {
            return Err(RejectReason::InFlight);
        }
        let id = self.next_turn;
        self.next_turn += 1;
        let message = ChatMessage::local(MessageRole::User, text);
        self.messages.push(message.clone());
        self.open = Some(OpenTurn { id, swept: false });
        self.revision += 1;
        Ok((TurnId(id), message))
    }

    /// Close the open turn with at most one assistant message.
    ///
    /// Only the id returned by the matching `begin_turn` closes the turn.
    pub fn finish_turn(&mut self, turn: TurnId, reply: ChatMessage) -> TurnClose {
        let open = match self.open {
            Some(open) if open.id == turn.0 => open,
            _ => return TurnClose::Stale,
        };
        self.open = None;
        self.revision += 1;
        if open.swept {
            return TurnClose::Discarded;
        }
        self.messages.push(reply);
        TurnClose::Appended
    }

    /// Swap in a whole new sequence (e.g. remotely loaded history).
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        self.sweep();
    }

    pub fn clear(&mut self) {
        self.messages = Vec::new();
        self.sweep();
    }

    fn sweep(&mut self) {
        if let Some(open) = self.open.as_mut() {
            open.swept = true;
        }
        self.revision += 1;
    }
}
