//! Anthropic API error schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Error envelope: `{ "type": "error", "error": { "type": "...", "message": "..." } }`.
#[derive(Debug, Deserialize, Serialize)]
pub struct AnthropicErrorBody {
    #[serde(rename = "error")]
    #[serde(default)]
    pub inner: AnthropicErrorObject,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AnthropicErrorObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
