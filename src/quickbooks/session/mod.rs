mod actor;

pub use actor::QuickBooksSessionHandle;

use crate::error::OauthError;
use crate::oauth_utils::OauthTokenResponse;
use chrono::{DateTime, Duration, Utc};
use oauth2::TokenResponse;
use serde::Serialize;

/// Lead time before access-token expiry at which the proactive refresh fires.
pub const REFRESH_LEAD: Duration = Duration::minutes(5);

/// Intuit access tokens live one hour; used when the token response omits `expires_in`.
const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::hours(1);

/// One OAuth token set. Replaced wholesale on refresh, never mutated field by field.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    access_token: String,
    refresh_token: String,
    token_type: String,
    expires_at: DateTime<Utc>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Builds a token set from a token endpoint response received at `now`.
    ///
    /// `previous_refresh_token` is reused when a refresh response omits `refresh_token`; a code
    /// exchange passes `None`, so a response without one is rejected.
    pub(crate) fn from_token_response(
        resp: &OauthTokenResponse,
        previous_refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, OauthError> {
        let refresh_token = resp
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh_token.map(ToString::to_string))
            .filter(|t| !t.is_empty())
            .ok_or(OauthError::MissingRefreshToken)?;

        let ttl = resp
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL);

        let refresh_token_expires_at = resp
            .extra_fields()
            .x_refresh_token_expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| now + Duration::seconds(secs));

        Ok(Self {
            access_token: resp.access_token().secret().clone(),
            refresh_token,
            token_type: resp.token_type().as_ref().to_string(),
            expires_at: now + ttl,
            refresh_token_expires_at,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn refresh_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_token_expires_at
    }

    /// Delay until the proactive refresh should fire, or `None` when less than
    /// [`REFRESH_LEAD`] of lifetime remains.
    pub fn refresh_delay(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let fire_at = self.expires_at - REFRESH_LEAD;
        (fire_at - now)
            .to_std()
            .ok()
            .filter(|delay| !delay.is_zero())
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("refresh_token_expires_at", &self.refresh_token_expires_at)
            .finish()
    }
}

/// Tokens plus the realm they were issued for. Present or absent as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub realm_id: String,
    pub tokens: TokenSet,
}

/// Read-only connection summary exposed to the frontend and the tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm_id: Option<String>,
    pub has_tokens: bool,
}

impl AuthState {
    pub(crate) fn of(session: Option<&Session>) -> Self {
        match session {
            Some(s) => Self {
                is_authenticated: true,
                realm_id: Some(s.realm_id.clone()),
                has_tokens: true,
            },
            None => Self {
                is_authenticated: false,
                realm_id: None,
                has_tokens: false,
            },
        }
    }
}
