use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

/// QuickBooks Online OAuth client and API endpoints.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuickBooksConfig {
    /// OAuth client id of the Intuit developer app.
    /// Env: `QUICKBOOKS_CLIENT_ID`. Required.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub client_id: String,

    /// OAuth client secret.
    /// Env: `QUICKBOOKS_CLIENT_SECRET`. Required.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub client_secret: String,

    /// Redirect URI registered with the app; must point at `/api/auth/callback`.
    /// Env: `QUICKBOOKS_REDIRECT_URI`. Required.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub redirect_uri: String,

    /// Accounting API base. Env: `QUICKBOOKS_API_URL`. Default: sandbox.
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// Env: `QUICKBOOKS_AUTH_URL`.
    #[serde(default = "default_auth_url")]
    pub auth_url: Url,

    /// Env: `QUICKBOOKS_TOKEN_URL`.
    #[serde(default = "default_token_url")]
    pub token_url: Url,

    /// Fixed `state` value placed on the authorization URL.
    /// Env: `QUICKBOOKS_OAUTH_STATE`. Default: `quickbooks-bridge`.
    #[serde(default = "default_oauth_state")]
    pub oauth_state: String,
}

impl Default for QuickBooksConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            api_url: default_api_url(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            oauth_state: default_oauth_state(),
        }
    }
}

impl std::fmt::Debug for QuickBooksConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secret = (!self.client_secret.is_empty()).then_some("<redacted>");
        f.debug_struct("QuickBooksConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &secret)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_url", &self.api_url.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("oauth_state", &self.oauth_state)
            .finish()
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for quickbooks credentials",
        )),
    }
}

fn default_api_url() -> Url {
    Url::parse("https://sandbox-quickbooks.api.intuit.com").expect("static api url is valid")
}

fn default_auth_url() -> Url {
    Url::parse("https://appcenter.intuit.com/connect/oauth2").expect("static auth url is valid")
}

fn default_token_url() -> Url {
    Url::parse("https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer")
        .expect("static token url is valid")
}

fn default_oauth_state() -> String {
    "quickbooks-bridge".to_string()
}
