//! Anthropic Messages API response schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub content: Vec<MessagesContentBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<MessagesUsage>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// One content block. Only text blocks are consumed; tool use and thinking blocks fall into
/// `Other`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagesContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessagesUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl MessagesResponse {
    /// Text of the first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            MessagesContentBlock::Text { text } => Some(text.as_str()),
            MessagesContentBlock::Other => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_text_skips_non_text_blocks() {
        let resp: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "You have 3 customers." },
                { "type": "text", "text": "second" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 12, "output_tokens": 7 }
        }))
        .expect("response parses");

        assert_eq!(resp.first_text(), Some("You have 3 customers."));
        assert_eq!(resp.usage.as_ref().map(|u| u.output_tokens), Some(7));
        assert!(resp.extra.contains_key("role"));
    }

    #[test]
    fn empty_content_has_no_text() {
        let resp: MessagesResponse =
            serde_json::from_value(json!({ "content": [] })).expect("response parses");
        assert!(resp.first_text().is_none());
    }
}
