//! Application state wiring the infra adapters together.
//!
//! AppState holds the concrete gateway and store used by every command. The
//! core components are generic over the `BackendGateway` / `SessionStore`
//! ports; the aliases below pin them to the infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use dowurk_core::chat::{ConversationSessionManager, GuideChatSession};
use dowurk_core::payment::PaymentConfirmationPoller;
use dowurk_infra::config::{load_client_config, resolve_data_dir};
use dowurk_infra::http::HttpBackendGateway;
use dowurk_infra::store::FileSessionStore;
use dowurk_types::chat::{ContextType, SessionId};
use dowurk_types::config::ClientConfig;

pub type ConcretePoller = PaymentConfirmationPoller<HttpBackendGateway, FileSessionStore>;
pub type ConcreteAssistant = ConversationSessionManager<HttpBackendGateway>;
pub type ConcreteGuide = GuideChatSession<HttpBackendGateway>;

/// Shared application state for CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<HttpBackendGateway>,
    pub store: Arc<FileSessionStore>,
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data dir, load `config.toml`, and build the adapters.
    ///
    /// `backend_url` overrides the configured backend when given.
    pub async fn init(backend_url: Option<String>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let mut config = load_client_config(&data_dir).await;
        if let Some(url) = backend_url {
            config.backend_url = url;
        }
        tracing::debug!(backend_url = %config.backend_url, data_dir = %data_dir.display(), "client state initialized");

        let gateway = HttpBackendGateway::new(&config)
            .with_context(|| format!("Invalid backend URL '{}'", config.backend_url))?;
        let store = FileSessionStore::new(&data_dir);

        Ok(Self {
            gateway: Arc::new(gateway),
            store: Arc::new(store),
            config,
            data_dir,
        })
    }

    pub fn poller(&self) -> ConcretePoller {
        PaymentConfirmationPoller::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.store),
            self.config.payment.clone(),
        )
    }

    /// A business-assistant conversation, resuming `session` when given.
    pub fn assistant(&self, session: Option<String>) -> ConcreteAssistant {
        match session {
            Some(id) => {
                ConversationSessionManager::with_session_id(Arc::clone(&self.gateway), SessionId::from(id))
            }
            None => ConversationSessionManager::new(Arc::clone(&self.gateway)),
        }
    }

    pub fn guide(&self, context_type: ContextType) -> ConcreteGuide {
        GuideChatSession::new(Arc::clone(&self.gateway), context_type)
    }
}
