use axum::{Json, http::StatusCode, response::IntoResponse};
use quickbooks_bridge_schema::QuickBooksFaultBody;
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::{error, warn};

use super::oauth::OauthError;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    /// OAuth code exchange or refresh was rejected. A failed refresh has already cleared the
    /// session by the time this is returned.
    #[error("{0}")]
    Authentication(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{message}")]
    UpstreamApi {
        status: StatusCode,
        message: String,
        fault: Option<Box<QuickBooksFaultBody>>,
    },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Oauth(#[from] OauthError),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("MCP transport error: {0}")]
    Mcp(String),
}

impl BridgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::Authentication(_) | BridgeError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            BridgeError::UpstreamApi { status, .. } => *status,
            BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::Oauth(_)
            | BridgeError::ReqwestError(_)
            | BridgeError::JsonError(_)
            | BridgeError::Assistant(_) => StatusCode::BAD_GATEWAY,
            BridgeError::UrlError(_) | BridgeError::RactorError(_) | BridgeError::Mcp(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Fault payload reported by QuickBooks, if this error carries one.
    pub fn fault(&self) -> Option<&QuickBooksFaultBody> {
        match self {
            BridgeError::UpstreamApi { fault, .. } => fault.as_deref(),
            _ => None,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let message = match &self {
            BridgeError::UrlError(_) | BridgeError::RactorError(_) | BridgeError::Mcp(_) => {
                "An internal server error occurred.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiErrorBody::new(message))).into_response()
    }
}

/// Failure envelope shared by every route: `{ "success": false, "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub success: bool,
    pub error: String,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
