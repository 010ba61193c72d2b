use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};
use url::Url;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// Env: `LISTEN_ADDR`. TOML: `basic.listen_addr`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// Env: `PORT`. TOML: `basic.listen_port`. Default: `3001`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// Env: `LOG_LEVEL`. TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Browser origins allowed by CORS. Accepts a TOML array or a comma-separated string.
    /// Env: `ALLOWED_ORIGINS`. Default: `http://localhost:3000,http://localhost:5173`.
    #[serde(default = "default_allowed_origins")]
    #[serde(deserialize_with = "deserialize_list_lax")]
    pub allowed_origins: Vec<String>,

    /// Where the OAuth callback redirects the browser once the exchange settles.
    /// Env: `FRONTEND_URL`. Default: `http://localhost:3000`.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: Url,

    /// Serve the MCP tool server on stdin/stdout next to the HTTP server.
    /// Env: `MCP_STDIO`. Default: `true`.
    #[serde(default = "default_mcp_stdio")]
    pub mcp_stdio: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            loglevel: default_loglevel(),
            allowed_origins: default_allowed_origins(),
            frontend_url: default_frontend_url(),
            mcp_stdio: default_mcp_stdio(),
        }
    }
}

fn deserialize_list_lax<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    let items = match v {
        Value::String(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        Value::Array(values) => values
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(serde::de::Error::custom(format!(
                    "expected string entries in basic.allowed_origins, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, D::Error>>()?,
        _ => {
            return Err(serde::de::Error::custom(
                "expected a comma-separated string or an array for basic.allowed_origins",
            ));
        }
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

fn default_listen_port() -> u16 {
    3001
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_frontend_url() -> Url {
    Url::parse("http://localhost:3000").expect("static frontend url is valid")
}

fn default_mcp_stdio() -> bool {
    true
}
