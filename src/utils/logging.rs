use serde::Serialize;
use serde_json::Value;

/// JSON keys whose values never reach the logs.
const SENSITIVE_KEYS: &[&str] = &[
    "access_token",
    "refresh_token",
    "id_token",
    "client_secret",
    "password",
    "code",
];

const REDACTED: &str = "[REDACTED]";
const CODE_PREVIEW_CHARS: usize = 10;

pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let redacted = serde_json::to_value(value).map(redact_sensitive);
    let pretty_json = redacted
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(pretty_json.as_str());
}

/// Replace the values of sensitive keys at any depth.
pub(crate) fn redact_sensitive(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    if SENSITIVE_KEYS.iter().any(|s| k.eq_ignore_ascii_case(s)) {
                        (k, Value::String(REDACTED.to_string()))
                    } else {
                        (k, redact_sensitive(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_sensitive).collect()),
        other => other,
    }
}

/// Authorization codes are logged as a short prefix only.
pub(crate) fn code_preview(code: &str) -> String {
    match code.char_indices().nth(CODE_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &code[..idx]),
        None => code.to_string(),
    }
}
