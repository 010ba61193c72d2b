mod common;

use axum::http::StatusCode;
use common::spawn_authenticated_services;
use quickbooks_bridge::BridgeError;
use quickbooks_bridge::quickbooks::CustomerQuery;
use serde_json::json;
use std::sync::atomic::Ordering;

fn auth_fault() -> serde_json::Value {
    json!({
        "fault": {
            "error": [{
                "message": "message=AuthenticationFailed; errorCode=003200; statusCode=401",
                "detail": "Token expired",
                "code": "3200"
            }],
            "type": "AUTHENTICATION"
        }
    })
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_replays_once() {
    let (mock, _cfg, services) = spawn_authenticated_services().await;
    mock.push_api_response(StatusCode::UNAUTHORIZED, auth_fault());

    let rows = services
        .gateway
        .get_customers(&CustomerQuery::default())
        .await
        .expect("replayed request succeeds");
    assert_eq!(rows.len(), 1);

    assert_eq!(mock.refresh_hits(), 1);
    assert_eq!(mock.api_hits(), 2);
    assert_eq!(mock.api_call(0).bearer.as_deref(), Some("access-from-code"));
    assert_eq!(mock.api_call(1).bearer.as_deref(), Some("access-from-refresh-1"));
    assert_eq!(mock.api_call(0).param("query"), mock.api_call(1).param("query"));

    let session = services.session.session().await.expect("session").expect("present");
    assert_eq!(session.tokens.access_token(), "access-from-refresh-1");
}

#[tokio::test]
async fn second_unauthorized_returns_the_replay_error() {
    let (mock, _cfg, services) = spawn_authenticated_services().await;
    mock.push_api_response(StatusCode::UNAUTHORIZED, auth_fault());
    mock.push_api_response(
        StatusCode::UNAUTHORIZED,
        json!({ "fault": { "error": [{ "message": "Still unauthorized", "code": "3201" }] } }),
    );

    let err = services
        .gateway
        .get_customers(&CustomerQuery::default())
        .await
        .expect_err("replay rejected");
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Still unauthorized");

    assert_eq!(mock.refresh_hits(), 1);
    assert_eq!(mock.api_hits(), 2);
}

#[tokio::test]
async fn failed_refresh_on_unauthorized_clears_session() {
    let (mock, _cfg, services) = spawn_authenticated_services().await;
    mock.fail_refresh.store(true, Ordering::SeqCst);
    mock.push_api_response(StatusCode::UNAUTHORIZED, auth_fault());

    let err = services
        .gateway
        .get_customers(&CustomerQuery::default())
        .await
        .expect_err("refresh rejected");
    assert!(matches!(err, BridgeError::Authentication(_)));
    assert_eq!(mock.api_hits(), 1);
    assert!(!services.session.is_authenticated().await.expect("state"));
}
