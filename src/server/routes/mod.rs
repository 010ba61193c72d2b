pub mod auth;
pub mod chat;
pub mod health;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Success envelope shared by the API routes: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
