use crate::config::AssistantConfig;
use crate::error::BridgeError;
use crate::quickbooks::HTTP_TIMEOUT;
use async_trait::async_trait;
use quickbooks_bridge_schema::{AnthropicErrorBody, MessagesRequest, MessagesResponse};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use url::Url;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Text-completion seam used by the chat orchestrator.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, BridgeError>;
}

/// Anthropic Messages API backend.
pub struct AnthropicChatModel {
    http: reqwest::Client,
    messages_url: Url,
    model: String,
    max_tokens: u32,
}

impl AnthropicChatModel {
    /// Returns `None` when no API key is configured.
    pub fn from_config(cfg: &AssistantConfig) -> Result<Option<Self>, BridgeError> {
        let Some(api_key) = cfg.api_key() else {
            return Ok(None);
        };

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| BridgeError::Assistant("ANTHROPIC_API_KEY is not a valid header value".to_string()))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(HTTP_TIMEOUT * 4)
            .build()?;

        Ok(Some(Self {
            http,
            messages_url: cfg.api_url.join("v1/messages")?,
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
        }))
    }
}

#[async_trait]
impl ChatModel for AnthropicChatModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, BridgeError> {
        let body = MessagesRequest::single_turn(&self.model, self.max_tokens, system, prompt);
        debug!(model = %self.model, prompt_chars = prompt.len(), "Anthropic messages request");

        let resp = self
            .http
            .post(self.messages_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorBody>(&text)
                .ok()
                .and_then(|e| e.inner.message)
                .unwrap_or_else(|| format!("Anthropic API error: {status}"));
            warn!(status = status.as_u16(), error = %message, "Anthropic messages request failed");
            return Err(BridgeError::Assistant(message));
        }

        let parsed: MessagesResponse = resp.json().await?;
        parsed
            .first_text()
            .map(ToString::to_string)
            .ok_or_else(|| BridgeError::Assistant("Model returned no text content".to_string()))
    }
}
