use super::ApiEnvelope;
use crate::error::BridgeError;
use crate::quickbooks::AuthState;
use crate::server::router::BridgeState;
use crate::utils::logging::code_preview;
use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

const INITIATE_MESSAGE: &str = "Visit this URL to authenticate with QuickBooks";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub realm_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateData {
    pub auth_url: String,
    pub message: &'static str,
}

/// GET /api/auth/status
pub async fn auth_status(
    State(state): State<BridgeState>,
) -> Result<Json<ApiEnvelope<AuthState>>, BridgeError> {
    let auth = state.session.auth_state().await?;
    info!(
        is_authenticated = auth.is_authenticated,
        realm_id = auth.realm_id.as_deref().unwrap_or("-"),
        "Auth status requested"
    );
    Ok(Json(ApiEnvelope::ok(auth)))
}

/// GET /api/auth/initiate
pub async fn auth_initiate(State(state): State<BridgeState>) -> Json<ApiEnvelope<InitiateData>> {
    let auth_url = state.session.oauth().authorize_url();
    info!(auth_url = %auth_url, "QuickBooks authorization URL issued");
    Json(ApiEnvelope::ok(InitiateData {
        auth_url: auth_url.into(),
        message: INITIATE_MESSAGE,
    }))
}

/// GET /api/auth/callback
///
/// Always redirects back to the frontend with `auth=success&realmId=...` or `auth=error`.
pub async fn auth_callback(
    State(state): State<BridgeState>,
    Query(query): Query<AuthCallbackQuery>,
) -> Redirect {
    match complete_authorization(&state, query).await {
        Ok(realm_id) => {
            info!(realm_id = %realm_id, "OAuth authentication successful");
            Redirect::temporary(frontend_redirect(&state.frontend_url, Some(&realm_id)).as_str())
        }
        Err(e) => {
            error!(error = %e, "OAuth callback failed");
            Redirect::temporary(frontend_redirect(&state.frontend_url, None).as_str())
        }
    }
}

async fn complete_authorization(
    state: &BridgeState,
    query: AuthCallbackQuery,
) -> Result<String, BridgeError> {
    if let Some(err) = query.error.as_deref() {
        return Err(BridgeError::Authentication(format!(
            "Authorization was denied: {err}"
        )));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BridgeError::Validation("No authorization code received".to_string()))?;
    let realm_id = query
        .realm_id
        .filter(|r| !r.is_empty())
        .ok_or_else(|| BridgeError::Validation("No realmId received".to_string()))?;

    let expected = state.session.oauth().expected_state();
    if query.state.as_deref() != Some(expected) {
        warn!(
            received = query.state.as_deref().unwrap_or("-"),
            "OAuth callback state does not match the issued state"
        );
    }
    info!(code = %code_preview(&code), realm_id = %realm_id, "OAuth callback received");

    state.session.authenticate(&code, &realm_id).await?;
    Ok(realm_id)
}

fn frontend_redirect(frontend: &Url, realm_id: Option<&str>) -> Url {
    let mut url = frontend.clone();
    {
        let mut pairs = url.query_pairs_mut();
        match realm_id {
            Some(realm) => {
                pairs.append_pair("auth", "success").append_pair("realmId", realm);
            }
            None => {
                pairs.append_pair("auth", "error");
            }
        }
    }
    url
}
