#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use quickbooks_bridge::Services;
use quickbooks_bridge::config::Config;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};
use tokio::net::TcpListener;
use url::Url;

pub const REALM: &str = "9130357";
pub const GOOD_CODE: &str = "AB11700000000authcode";

#[derive(Debug, Clone)]
pub struct CapturedApiCall {
    pub realm: String,
    pub resource: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
}

impl CapturedApiCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Stand-in for the Intuit token endpoint, the accounting API and the Messages API.
#[derive(Clone, Default)]
pub struct MockUpstream {
    pub token_grants: Arc<Mutex<Vec<String>>>,
    pub api_calls: Arc<Mutex<Vec<CapturedApiCall>>>,
    pub llm_calls: Arc<Mutex<Vec<Value>>>,
    pub api_script: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    pub fail_refresh: Arc<AtomicBool>,
    /// `expires_in` for issued access tokens; zero means one hour.
    pub token_lifetime_secs: Arc<AtomicU64>,
    /// Delay before answering a refresh grant.
    pub refresh_delay_ms: Arc<AtomicU64>,
    refresh_count: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn token_hits(&self) -> usize {
        self.token_grants.lock().unwrap().len()
    }

    pub fn refresh_hits(&self) -> usize {
        self.token_grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.as_str() == "refresh_token")
            .count()
    }

    pub fn api_hits(&self) -> usize {
        self.api_calls.lock().unwrap().len()
    }

    pub fn api_call(&self, idx: usize) -> CapturedApiCall {
        self.api_calls.lock().unwrap()[idx].clone()
    }

    fn expires_in(&self) -> u64 {
        match self.token_lifetime_secs.load(Ordering::SeqCst) {
            0 => 3600,
            secs => secs,
        }
    }

    /// Queue a response for the next accounting API call; unscripted calls get a default body.
    pub fn push_api_response(&self, status: StatusCode, body: Value) {
        self.api_script.lock().unwrap().push_back((status, body));
    }
}

async fn token_handler(
    State(state): State<MockUpstream>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> (StatusCode, Json<Value>) {
    assert!(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Basic ")),
        "token endpoint expects client credentials via basic auth"
    );

    let form: HashMap<String, String> = url::form_urlencoded::parse(&body).into_owned().collect();
    let grant_type = form.get("grant_type").cloned().unwrap_or_default();
    state.token_grants.lock().unwrap().push(grant_type.clone());
    let expires_in = state.expires_in();

    if grant_type == "refresh_token" {
        let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
    }

    match grant_type.as_str() {
        "authorization_code" if form.get("code").map(String::as_str) == Some(GOOD_CODE) => (
            StatusCode::OK,
            Json(json!({
                "access_token": "access-from-code",
                "refresh_token": "refresh-from-code",
                "token_type": "bearer",
                "expires_in": expires_in,
                "x_refresh_token_expires_in": 8_726_400
            })),
        ),
        "refresh_token" if !state.fail_refresh.load(Ordering::SeqCst) => {
            let n = state.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": format!("access-from-refresh-{n}"),
                    "refresh_token": format!("refresh-from-refresh-{n}"),
                    "token_type": "bearer",
                    "expires_in": expires_in,
                    "x_refresh_token_expires_in": 8_726_400
                })),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Token invalid"
            })),
        ),
    }
}

async fn company_handler(
    State(state): State<MockUpstream>,
    Path((realm, resource)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let query: Vec<(String, String)> = query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    state.api_calls.lock().unwrap().push(CapturedApiCall {
        realm,
        resource: resource.clone(),
        query,
        bearer,
    });

    if let Some((status, body)) = state.api_script.lock().unwrap().pop_front() {
        return (status, Json(body));
    }

    let body = if resource == "query" {
        json!({
            "QueryResponse": {
                "Customer": [{ "Id": "1", "DisplayName": "Amy's Bird Sanctuary" }],
                "Invoice": [{ "Id": "130", "TotalAmt": 150.0 }],
                "Account": [{ "Id": "35", "Name": "Checking", "AccountType": "Bank" }],
                "startPosition": 1,
                "maxResults": 1
            },
            "time": "2024-02-01T10:21:33.512-08:00"
        })
    } else {
        json!({
            "Header": { "ReportName": resource.trim_start_matches("reports/") },
            "Rows": { "Row": [] }
        })
    };
    (StatusCode::OK, Json(body))
}

async fn messages_handler(
    State(state): State<MockUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    assert_eq!(
        headers.get("x-api-key").and_then(|v| v.to_str().ok()),
        Some("test-anthropic-key")
    );
    state.llm_calls.lock().unwrap().push(body);
    (
        StatusCode::OK,
        Json(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "content": [{ "type": "text", "text": "You have one customer." }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 10, "output_tokens": 6 }
        })),
    )
}

pub async fn spawn_mock_upstream() -> (MockUpstream, Url) {
    let state = MockUpstream::default();
    let app = Router::new()
        .route("/oauth2/v1/tokens/bearer", post(token_handler))
        .route("/v3/company/{realm}/{*resource}", get(company_handler))
        .route("/v1/messages", post(messages_handler))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{addr}/")).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (state, base)
}

/// Config pointing every upstream at `base`.
pub fn test_config(base: &Url) -> Config {
    let mut cfg = Config::default();
    cfg.quickbooks.client_id = "ABtestclient".to_string();
    cfg.quickbooks.client_secret = "test-secret".to_string();
    cfg.quickbooks.redirect_uri = "http://localhost:3001/api/auth/callback".to_string();
    cfg.quickbooks.api_url = base.clone();
    cfg.quickbooks.token_url = base.join("oauth2/v1/tokens/bearer").expect("token url");
    cfg.assistant.api_key = Some("test-anthropic-key".to_string());
    cfg.assistant.api_url = base.clone();
    cfg.validate().expect("test config is valid");
    cfg
}

pub async fn spawn_services() -> (MockUpstream, Config, Services) {
    let (mock, base) = spawn_mock_upstream().await;
    let cfg = test_config(&base);
    let services = Services::spawn(&cfg).await.expect("services spawn");
    (mock, cfg, services)
}

pub async fn spawn_authenticated_services() -> (MockUpstream, Config, Services) {
    let (mock, cfg, services) = spawn_services().await;
    services
        .session
        .authenticate(GOOD_CODE, REALM)
        .await
        .expect("authenticate");
    (mock, cfg, services)
}
