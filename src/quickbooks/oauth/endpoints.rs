use crate::config::QuickBooksConfig;
use crate::error::{BridgeError, OauthError};
use crate::oauth_utils::{OauthTokenResponse, StandardOauth2Client, build_oauth2_client};
use crate::quickbooks::{ACCOUNTING_SCOPE, HTTP_TIMEOUT};
use crate::utils::logging::with_pretty_json_debug;
use oauth2::{AuthorizationCode, CsrfToken, RedirectUrl, RefreshToken, Scope};
use tracing::{debug, info};

/// Intuit OAuth endpoints bound to the configured app credentials.
pub struct QuickBooksOauth {
    client: StandardOauth2Client,
    http: reqwest::Client,
    state: String,
}

impl QuickBooksOauth {
    pub fn new(cfg: &QuickBooksConfig) -> Result<Self, BridgeError> {
        let redirect = RedirectUrl::new(cfg.redirect_uri.trim().to_string())?;
        let client = build_oauth2_client(
            cfg.client_id.trim(),
            Some(cfg.client_secret.trim()),
            cfg.auth_url.as_str(),
            cfg.token_url.as_str(),
            redirect,
        )?;

        // Token endpoints must not be followed through redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            http,
            state: cfg.oauth_state.clone(),
        })
    }

    /// Consent URL carrying `client_id`, `response_type=code`, the accounting scope,
    /// `redirect_uri` and the fixed `state`.
    pub fn authorize_url(&self) -> url::Url {
        let state = self.state.clone();
        let (url, _state) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new(ACCOUNTING_SCOPE.to_string()))
            .url();
        url
    }

    /// The `state` value the callback is expected to echo back.
    pub fn expected_state(&self) -> &str {
        &self.state
    }

    pub(crate) async fn exchange_code(&self, code: &str) -> Result<OauthTokenResponse, OauthError> {
        let token_result: OauthTokenResponse = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await?;
        with_pretty_json_debug(&token_result, |json| {
            debug!(response = %json, "QuickBooks code exchange response");
        });
        info!("QuickBooks OAuth2 code exchange completed successfully");
        Ok(token_result)
    }

    pub(crate) async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<OauthTokenResponse, OauthError> {
        let token_result: OauthTokenResponse = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await?;
        with_pretty_json_debug(&token_result, |json| {
            debug!(response = %json, "QuickBooks OAuth2 refresh exchange completed");
        });
        Ok(token_result)
    }
}
