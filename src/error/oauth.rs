use super::bridge::BridgeError;
use axum::http::StatusCode;
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use thiserror::Error as ThisError;

const BODY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, ThisError)]
pub enum OauthError {
    #[error("OAuth2 request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OAuth2 upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("OAuth2 server response error: {error}")]
    ServerResponse { error: String },

    #[error("OAuth2 token endpoint parse error: {message}. Body: {body}")]
    Parse { message: String, body: String },

    #[error("OAuth2 token response has no refresh_token")]
    MissingRefreshToken,

    #[error("OAuth2 unexpected error: {message}")]
    Other { message: String },
}

type QuickBooksRequestTokenError = RequestTokenError<
    HttpClientError<ReqwestClientError>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

impl From<QuickBooksRequestTokenError> for OauthError {
    fn from(e: QuickBooksRequestTokenError) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => OauthError::ServerResponse {
                error: match err.error_description() {
                    Some(desc) => format!("{} ({desc})", err.error()),
                    None => err.error().to_string(),
                },
            },
            RequestTokenError::Request(wrapper) => match wrapper {
                HttpClientError::Reqwest(real_err) => OauthError::Request(*real_err),
                other => OauthError::Other {
                    message: format!("HttpClientError: {other:?}"),
                },
            },
            RequestTokenError::Parse(parse_err, body) => {
                let body_str = String::from_utf8_lossy(&body);
                let body = body_str
                    .char_indices()
                    .nth(BODY_PREVIEW_CHARS)
                    .map_or_else(
                        || body_str.to_string(),
                        |(idx, _)| format!("{}...<truncated>", &body_str[..idx]),
                    );
                OauthError::Parse {
                    message: parse_err.to_string(),
                    body,
                }
            }
            RequestTokenError::Other(s) => OauthError::Other { message: s },
        }
    }
}

impl From<QuickBooksRequestTokenError> for BridgeError {
    fn from(e: QuickBooksRequestTokenError) -> Self {
        OauthError::from(e).into()
    }
}
