//! QuickBooks Online fault schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structured error payload returned by the accounting API on non-2xx responses.
///
/// Most endpoints answer with `{"Fault": {"Error": [...], "type": "..."}}`; the authentication
/// layer answers with the same shape in lowercase (`{"fault": {"error": [...]}}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuickBooksFaultBody {
    #[serde(rename = "Fault", alias = "fault")]
    pub fault: QuickBooksFault,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuickBooksFault {
    #[serde(rename = "Error", alias = "error", default)]
    pub errors: Vec<QuickBooksFaultError>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuickBooksFaultError {
    #[serde(rename = "Message", alias = "message", default)]
    pub message: String,

    #[serde(rename = "Detail", alias = "detail", skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl QuickBooksFaultBody {
    /// The first reported error, which is the one surfaced to callers.
    pub fn first_error(&self) -> Option<&QuickBooksFaultError> {
        self.fault.errors.first()
    }

    /// Message of the first reported error, if it carries a non-empty one.
    pub fn first_message(&self) -> Option<&str> {
        self.first_error()
            .map(|e| e.message.as_str())
            .filter(|m| !m.trim().is_empty())
    }
}
