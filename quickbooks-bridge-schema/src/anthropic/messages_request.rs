//! Anthropic Messages API request schema.

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub messages: Vec<MessagesRequestMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequestMessage {
    pub role: String,
    pub content: String,
}

impl MessagesRequestMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl MessagesRequest {
    /// Single-turn request: one system prompt and one user message.
    pub fn single_turn(
        model: impl Into<String>,
        max_tokens: u32,
        system: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system: Some(system.into()),
            messages: vec![MessagesRequestMessage::user(prompt)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_turn_serializes_system_and_user_message() {
        let req = MessagesRequest::single_turn("claude-test", 2000, "be brief", "hello");
        let v = serde_json::to_value(&req).expect("serialize");
        assert_eq!(
            v,
            json!({
                "model": "claude-test",
                "max_tokens": 2000,
                "system": "be brief",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn system_is_omitted_when_absent() {
        let req = MessagesRequest {
            model: "m".to_string(),
            max_tokens: 10,
            system: None,
            messages: vec![MessagesRequestMessage::user("x")],
        };
        let v = serde_json::to_value(&req).expect("serialize");
        assert!(v.get("system").is_none());
    }
}
