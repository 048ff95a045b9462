//! Scripted gateway and in-memory store shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dowurk_types::chat::{
    AssistantReply, AssistantRequest, ChatMessage, GuideReply, GuideRequest,
};
use dowurk_types::error::{GatewayError, StoreError};
use dowurk_types::payment::{CheckoutMetadata, CheckoutStatus};
use dowurk_types::user::USER_RECORD_KEY;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::gateway::BackendGateway;
use crate::store::SessionStore;

pub fn pending() -> CheckoutStatus {
    CheckoutStatus {
        payment_status: "pending".to_string(),
        status: "open".to_string(),
        metadata: CheckoutMetadata::default(),
    }
}

pub fn paid(package_id: &str) -> CheckoutStatus {
    CheckoutStatus {
        payment_status: "paid".to_string(),
        status: "complete".to_string(),
        metadata: CheckoutMetadata {
            package_id: Some(package_id.to_string()),
            package_name: Some(format!("{package_id} plan")),
            ..Default::default()
        },
    }
}

pub fn expired() -> CheckoutStatus {
    CheckoutStatus {
        payment_status: "unpaid".to_string(),
        status: "expired".to_string(),
        metadata: CheckoutMetadata::default(),
    }
}

pub fn http_500() -> GatewayError {
    GatewayError::Status {
        status: 500,
        body: "internal error".to_string(),
    }
}

/// Gateway that replays scripted responses and records every call.
pub struct MockGateway {
    checkout_script: Mutex<VecDeque<Result<CheckoutStatus, GatewayError>>>,
    checkout_calls: Mutex<Vec<Instant>>,
    assistant_reply: Mutex<Result<AssistantReply, GatewayError>>,
    assistant_requests: Mutex<Vec<AssistantRequest>>,
    guide_reply: Mutex<Result<GuideReply, GatewayError>>,
    guide_requests: Mutex<Vec<GuideRequest>>,
    history: Mutex<Result<Vec<ChatMessage>, GatewayError>>,
    history_calls: AtomicUsize,
    clear_result: Mutex<Result<(), GatewayError>>,
    clear_calls: AtomicUsize,
    hold: Option<Arc<Notify>>,
    history_hold: Option<Arc<Notify>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            checkout_script: Mutex::new(VecDeque::new()),
            checkout_calls: Mutex::new(Vec::new()),
            assistant_reply: Mutex::new(Ok(AssistantReply {
                assistant_response: "ok".to_string(),
                timestamp: "2025-01-01T00:00:00Z".to_string(),
            })),
            assistant_requests: Mutex::new(Vec::new()),
            guide_reply: Mutex::new(Ok(GuideReply {
                response: "ok".to_string(),
                conversation_id: None,
            })),
            guide_requests: Mutex::new(Vec::new()),
            history: Mutex::new(Ok(Vec::new())),
            history_calls: AtomicUsize::new(0),
            clear_result: Mutex::new(Ok(())),
            clear_calls: AtomicUsize::new(0),
            hold: None,
            history_hold: None,
        }
    }

    /// Checkout responses, in order. Once exhausted every call reports `pending`.
    pub fn with_checkout(self, script: Vec<Result<CheckoutStatus, GatewayError>>) -> Self {
        *self.checkout_script.lock().unwrap() = script.into();
        self
    }

    pub fn with_assistant_reply(self, reply: Result<AssistantReply, GatewayError>) -> Self {
        *self.assistant_reply.lock().unwrap() = reply;
        self
    }

    pub fn with_guide_reply(self, reply: Result<GuideReply, GatewayError>) -> Self {
        *self.guide_reply.lock().unwrap() = reply;
        self
    }

    pub fn with_history(self, history: Result<Vec<ChatMessage>, GatewayError>) -> Self {
        *self.history.lock().unwrap() = history;
        self
    }

    pub fn with_clear_result(self, result: Result<(), GatewayError>) -> Self {
        *self.clear_result.lock().unwrap() = result;
        self
    }

    /// Make chat sends block until `release` is notified.
    pub fn held(mut self, release: Arc<Notify>) -> Self {
        self.hold = Some(release);
        self
    }

    /// Make history loads block until `release` is notified.
    pub fn held_history(mut self, release: Arc<Notify>) -> Self {
        self.history_hold = Some(release);
        self
    }

    pub fn checkout_calls(&self) -> Vec<Instant> {
        self.checkout_calls.lock().unwrap().clone()
    }

    pub fn assistant_requests(&self) -> Vec<AssistantRequest> {
        self.assistant_requests.lock().unwrap().clone()
    }

    pub fn guide_requests(&self) -> Vec<GuideRequest> {
        self.guide_requests.lock().unwrap().clone()
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    async fn wait_for_release(&self) {
        if let Some(release) = &self.hold {
            release.notified().await;
        }
    }
}

impl BackendGateway for MockGateway {
    async fn checkout_status(&self, _session_id: &str) -> Result<CheckoutStatus, GatewayError> {
        self.checkout_calls.lock().unwrap().push(Instant::now());
        self.checkout_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending()))
    }

    async fn send_business_message(
        &self,
        request: &AssistantRequest,
    ) -> Result<AssistantReply, GatewayError> {
        self.assistant_requests.lock().unwrap().push(request.clone());
        self.wait_for_release().await;
        self.assistant_reply.lock().unwrap().clone()
    }

    async fn send_guide_message(&self, request: &GuideRequest) -> Result<GuideReply, GatewayError> {
        self.guide_requests.lock().unwrap().push(request.clone());
        self.wait_for_release().await;
        self.guide_reply.lock().unwrap().clone()
    }

    async fn chat_history(&self, _session_id: &str) -> Result<Vec<ChatMessage>, GatewayError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.history_hold {
            release.notified().await;
        }
        self.history.lock().unwrap().clone()
    }

    async fn clear_chat_history(&self, _session_id: &str) -> Result<(), GatewayError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.clear_result.lock().unwrap().clone()
    }
}

/// In-memory store; writes can be made to fail.
#[derive(Default)]
pub struct MockStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
    fail_writes: bool,
}

impl MockStore {
    pub fn with_user(user: serde_json::Value) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(USER_RECORD_KEY.to_string(), user);
        store
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl SessionStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io("disk full".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
