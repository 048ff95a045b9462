//! Chat message, session, and request/response types.
//!
//! These types model the two assistant conversations the client drives:
//! the business-planning assistant (remotely persisted, keyed by session id)
//! and the general guide chat (rolling history window, no persistence).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Identifier of a business-assistant conversation.
///
/// Used verbatim as the remote persistence key for chat history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh session identifier (`session-<uuid v7>`).
    pub fn generate() -> Self {
        Self(format!("session-{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single message within a conversation.
///
/// `timestamp` is kept as the string the server sent so that replies are
/// shown exactly as stored remotely. Locally created messages use RFC 3339 UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "generate_message_id")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ChatMessage {
    /// Build a message stamped with a fresh local id and the current time.
    pub fn local(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Build an assistant message carrying a server-supplied timestamp.
    pub fn assistant_at(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }
}

fn generate_message_id() -> String {
    Uuid::now_v7().to_string()
}

/// Response body of `GET /api/ai/chat-history/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Request body of `POST /api/ai/business-plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub session_id: String,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_context: Option<String>,
}

/// Response body of `POST /api/ai/business-plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub assistant_response: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Topic hint sent with guide chat requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    #[default]
    General,
    BusinessPlanning,
    Grants,
    Legal,
    Marketing,
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextType::General => write!(f, "general"),
            ContextType::BusinessPlanning => write!(f, "business_planning"),
            ContextType::Grants => write!(f, "grants"),
            ContextType::Legal => write!(f, "legal"),
            ContextType::Marketing => write!(f, "marketing"),
        }
    }
}

impl FromStr for ContextType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "general" => Ok(ContextType::General),
            "business_planning" => Ok(ContextType::BusinessPlanning),
            "grants" => Ok(ContextType::Grants),
            "legal" => Ok(ContextType::Legal),
            "marketing" => Ok(ContextType::Marketing),
            other => Err(format!("invalid context type: '{other}'")),
        }
    }
}

/// One prior turn included in a guide chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Request body of `POST /api/ai/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideRequest {
    pub message: String,
    pub conversation_history: Vec<HistoryEntry>,
    pub context_type: ContextType,
}

/// Response body of `POST /api/ai/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}
