use crate::assistant::{AnthropicChatModel, ChatModel, ChatOrchestrator};
use crate::config::{BasicConfig, Config};
use crate::error::BridgeError;
use crate::mcp::{QuickBooksMcpServer, QuickBooksTools};
use crate::quickbooks::oauth::QuickBooksOauth;
use crate::quickbooks::{QueryGateway, QuickBooksClient, QuickBooksSessionHandle};
use crate::server::{BridgeState, bridge_router};
use axum::Router;
use std::sync::Arc;
use tracing::info;

/// Handles shared by the HTTP surface and the tool server.
///
/// Both front ends are built from the same session so a connection made through the
/// browser is visible to MCP tool calls and vice versa.
#[derive(Clone)]
pub struct Services {
    pub session: QuickBooksSessionHandle,
    pub gateway: QueryGateway,
    pub chat: ChatOrchestrator,
}

impl Services {
    pub async fn spawn(cfg: &Config) -> Result<Self, BridgeError> {
        let model: Option<Arc<dyn ChatModel>> = match AnthropicChatModel::from_config(&cfg.assistant)? {
            Some(model) => Some(Arc::new(model)),
            None => None,
        };
        Self::spawn_with_model(cfg, model).await
    }

    /// Like [`Services::spawn`] with an explicit chat model, or none to disable chat.
    pub async fn spawn_with_model(
        cfg: &Config,
        model: Option<Arc<dyn ChatModel>>,
    ) -> Result<Self, BridgeError> {
        info!(
            api_url = %cfg.quickbooks.api_url,
            auth_url = %cfg.quickbooks.auth_url,
            token_url = %cfg.quickbooks.token_url,
            redirect_uri = %cfg.quickbooks.redirect_uri,
            client_id = %cfg.quickbooks.client_id,
            "QuickBooks config (effective)"
        );
        info!(
            assistant_enabled = model.is_some(),
            assistant_api_url = %cfg.assistant.api_url,
            assistant_model = %cfg.assistant.model,
            assistant_max_tokens = cfg.assistant.max_tokens,
            "Assistant config (effective)"
        );

        let oauth = Arc::new(QuickBooksOauth::new(&cfg.quickbooks)?);
        let session = QuickBooksSessionHandle::spawn(oauth).await?;
        let client = QuickBooksClient::new(&cfg.quickbooks, session.clone())?;
        let gateway = QueryGateway::new(client);
        let chat = ChatOrchestrator::new(gateway.clone(), model);

        Ok(Self {
            session,
            gateway,
            chat,
        })
    }

    pub fn router(&self, basic: &BasicConfig) -> Router {
        info!(
            allowed_origins = ?basic.allowed_origins,
            frontend_url = %basic.frontend_url,
            "HTTP config (effective)"
        );
        let state = BridgeState::new(
            self.session.clone(),
            self.chat.clone(),
            basic.frontend_url.clone(),
            &basic.allowed_origins,
        );
        bridge_router(state)
    }

    pub fn mcp_server(&self) -> QuickBooksMcpServer {
        QuickBooksMcpServer::new(QuickBooksTools::new(self.gateway.clone()))
    }
}
