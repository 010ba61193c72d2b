use serde::{Deserialize, Serialize};
use url::Url;

/// LLM backend for the chat endpoint.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// Anthropic API key. Chat answers with a fixed notice when unset.
    /// Env: `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env: `ANTHROPIC_API_URL`. Default: `https://api.anthropic.com`.
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// Env: `ANTHROPIC_MODEL`. Default: `claude-3-5-sonnet-20241022`.
    #[serde(default = "default_model")]
    pub model: String,

    /// TOML: `assistant.max_tokens`. Default: `2000`.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl AssistantConfig {
    /// Key to use, treating a blank value as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("api_url", &self.api_url.as_str())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_api_url() -> Url {
    Url::parse("https://api.anthropic.com").expect("static anthropic url is valid")
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}
