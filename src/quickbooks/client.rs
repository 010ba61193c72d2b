use super::session::QuickBooksSessionHandle;
use super::{HTTP_TIMEOUT, MINOR_VERSION};
use crate::config::QuickBooksConfig;
use crate::error::BridgeError;
use quickbooks_bridge_schema::QuickBooksFaultBody;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

/// Authenticated client for the accounting API.
///
/// Injects the current bearer token and, on a 401, refreshes once and replays once.
#[derive(Clone)]
pub struct QuickBooksClient {
    http: reqwest::Client,
    api_base: Url,
    session: QuickBooksSessionHandle,
}

impl QuickBooksClient {
    pub fn new(cfg: &QuickBooksConfig, session: QuickBooksSessionHandle) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("quickbooks-bridge/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: cfg.api_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &QuickBooksSessionHandle {
        &self.session
    }

    /// `{api_base}/v3/company/{realm}/{resource...}?minorversion=65&{params}`.
    pub(crate) fn company_url(
        &self,
        realm_id: &str,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Url, BridgeError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| BridgeError::UrlError(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["v3", "company", realm_id])
            .extend(resource.split('/'));
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            if !params.iter().any(|(key, _)| *key == "minorversion") {
                pairs.append_pair("minorversion", MINOR_VERSION);
            }
        }
        Ok(url)
    }

    /// GETs `url` and decodes the JSON body.
    ///
    /// A 401 with a session present triggers exactly one refresh and one replay; the replay's
    /// outcome is returned as-is.
    pub(crate) async fn get_json(&self, url: Url) -> Result<Value, BridgeError> {
        let session = self.session.session().await?;
        let bearer = session.as_ref().map(|s| s.tokens.access_token());

        let resp = self.send(url.clone(), bearer).await?;
        if resp.status() != StatusCode::UNAUTHORIZED || session.is_none() {
            return Self::read_json(resp).await;
        }

        info!(path = %url.path(), "QuickBooks API returned 401; refreshing token and retrying once");
        let tokens = self.session.refresh().await?;
        let retry = self.send(url, Some(tokens.access_token())).await?;
        Self::read_json(retry).await
    }

    async fn send(&self, url: Url, bearer: Option<&str>) -> Result<reqwest::Response, BridgeError> {
        debug!(path = %url.path(), authenticated = bearer.is_some(), "QuickBooks API request");
        let mut req = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, BridgeError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<Value>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        let fault = serde_json::from_str::<QuickBooksFaultBody>(&body).ok();
        let message = fault
            .as_ref()
            .and_then(QuickBooksFaultBody::first_message)
            .map_or_else(
                || format!("QuickBooks API error: {status}"),
                ToString::to_string,
            );

        warn!(
            status = status.as_u16(),
            body = %preview(&body),
            "QuickBooks API request failed"
        );

        Err(BridgeError::UpstreamApi {
            status,
            message,
            fault: fault.map(Box::new),
        })
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(UPSTREAM_BODY_PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
