//! BackendGateway trait definition.
//!
//! The HTTP request/response boundary to the DowUrk backend. Every operation
//! the interaction layer performs against the server goes through this trait,
//! so the poller and the conversation managers can be driven by scripted
//! gateways in tests.
//!
//! Implementations live in dowurk-infra (e.g., `HttpBackendGateway`).

use dowurk_types::chat::{AssistantReply, AssistantRequest, ChatMessage, GuideReply, GuideRequest};
use dowurk_types::error::GatewayError;
use dowurk_types::payment::CheckoutStatus;

/// Trait for the backend HTTP boundary.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Any
/// non-success HTTP status, network failure, or undecodable body is reported
/// as a [`GatewayError`]; callers decide how to degrade.
pub trait BackendGateway: Send + Sync {
    /// `GET /api/payments/checkout/status/{session_id}`
    fn checkout_status(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<CheckoutStatus, GatewayError>> + Send;

    /// `POST /api/ai/business-plan`
    fn send_business_message(
        &self,
        request: &AssistantRequest,
    ) -> impl std::future::Future<Output = Result<AssistantReply, GatewayError>> + Send;

    /// `POST /api/ai/chat`
    fn send_guide_message(
        &self,
        request: &GuideRequest,
    ) -> impl std::future::Future<Output = Result<GuideReply, GatewayError>> + Send;

    /// `GET /api/ai/chat-history/{session_id}`, messages in chronological order.
    fn chat_history(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, GatewayError>> + Send;

    /// `DELETE /api/ai/chat-history/{session_id}`
    fn clear_chat_history(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}
