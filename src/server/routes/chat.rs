use super::{ApiEnvelope, timestamp};
use crate::error::BridgeError;
use crate::server::router::BridgeState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const MESSAGE_REQUIRED: &str = "Message is required and must be a string";
const LOG_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Serialize)]
pub struct ChatData {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<BridgeState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiEnvelope<ChatData>>, BridgeError> {
    let message = extract_message(body)?;
    let preview: String = message.chars().take(LOG_PREVIEW_CHARS).collect();
    info!(message = %preview, "Processing chat message");

    let reply = state.chat.process_message(&message).await;
    info!(
        has_data = reply.data.is_some(),
        has_error = reply.error.is_some(),
        "Chat message processed"
    );

    Ok(Json(ApiEnvelope::ok(ChatData {
        response: reply.response,
        data: reply.data,
        timestamp: timestamp(),
        error: reply.error,
    })))
}

fn extract_message(body: Result<Json<Value>, JsonRejection>) -> Result<String, BridgeError> {
    let Json(mut value) = body.map_err(|rejection| {
        debug!(error = %rejection, "Chat body rejected");
        BridgeError::Validation(MESSAGE_REQUIRED.to_string())
    })?;
    match value.get_mut("message").map(Value::take) {
        Some(Value::String(message)) if !message.is_empty() => Ok(message),
        _ => Err(BridgeError::Validation(MESSAGE_REQUIRED.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_string_message() {
        let msg = extract_message(Ok(Json(json!({ "message": "show me customers" }))));
        assert_eq!(msg.expect("message"), "show me customers");
    }

    #[test]
    fn rejects_missing_empty_or_non_string() {
        for body in [json!({}), json!({ "message": "" }), json!({ "message": 42 }), json!([1])] {
            let err = extract_message(Ok(Json(body))).expect_err("rejected");
            assert!(matches!(err, BridgeError::Validation(ref m) if m == MESSAGE_REQUIRED));
        }
    }
}
