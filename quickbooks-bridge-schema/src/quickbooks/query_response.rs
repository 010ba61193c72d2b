//! QuickBooks Online query endpoint envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response of `GET /v3/company/{realm}/query`.
///
/// Entity rows live under `QueryResponse.<EntityName>`; the envelope is otherwise passed
/// through untouched.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct QueryResponseBody {
    #[serde(rename = "QueryResponse", default)]
    pub query_response: QueryResponse,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_position: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,

    /// Entity arrays keyed by entity name (`Customer`, `Invoice`, `Account`, ...).
    #[serde(flatten)]
    pub entities: BTreeMap<String, Value>,
}

impl QueryResponseBody {
    /// Remove and return the rows for `entity`, or an empty list when the key is absent.
    ///
    /// QuickBooks omits the entity key entirely for empty result sets.
    pub fn take_entities(&mut self, entity: &str) -> Vec<Value> {
        match self.query_response.entities.remove(entity) {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        }
    }
}
