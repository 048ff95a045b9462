//! HttpBackendGateway -- concrete [`BackendGateway`] over the DowUrk REST API.
//!
//! All five endpoints live under `{backend_url}/api`. Path parameters are
//! appended as URL path segments so ids containing `/`, spaces or `?` are
//! percent-encoded instead of altering the route.

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use dowurk_core::gateway::BackendGateway;
use dowurk_types::chat::{
    AssistantReply, AssistantRequest, ChatHistory, ChatMessage, GuideReply, GuideRequest,
};
use dowurk_types::config::ClientConfig;
use dowurk_types::error::GatewayError;
use dowurk_types::payment::CheckoutStatus;

/// Backend gateway speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackendGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackendGateway {
    /// Build a gateway from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.backend_url)?,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, GatewayError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base_url}/api/{segments...}` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

impl BackendGateway for HttpBackendGateway {
    async fn checkout_status(&self, session_id: &str) -> Result<CheckoutStatus, GatewayError> {
        let url = self.endpoint(&["payments", "checkout", "status", session_id])?;
        tracing::debug!(%url, "checking checkout status");
        self.fetch_json(self.client.get(url)).await
    }

    async fn send_business_message(
        &self,
        request: &AssistantRequest,
    ) -> Result<AssistantReply, GatewayError> {
        let url = self.endpoint(&["ai", "business-plan"])?;
        self.fetch_json(self.client.post(url).json(request)).await
    }

    async fn send_guide_message(&self, request: &GuideRequest) -> Result<GuideReply, GatewayError> {
        let url = self.endpoint(&["ai", "chat"])?;
        self.fetch_json(self.client.post(url).json(request)).await
    }

    async fn chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, GatewayError> {
        let url = self.endpoint(&["ai", "chat-history", session_id])?;
        let history: ChatHistory = self.fetch_json(self.client.get(url)).await?;
        Ok(history.messages)
    }

    async fn clear_chat_history(&self, session_id: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["ai", "chat-history", session_id])?;
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw).map_err(|e| GatewayError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(GatewayError::InvalidUrl(format!("{raw}: not a base URL")));
    }
    Ok(url)
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_decode() {
        GatewayError::Decode(e.to_string())
    } else if e.is_timeout() {
        GatewayError::Network(format!("request timed out: {e}"))
    } else {
        GatewayError::Network(format!("HTTP request failed: {e}"))
    }
}
