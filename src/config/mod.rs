mod assistant;
mod basic;
mod quickbooks;

pub use assistant::AssistantConfig;
pub use basic::BasicConfig;
pub use quickbooks::QuickBooksConfig;

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// QuickBooks OAuth app and API endpoints (see `quickbooks` table in config.toml).
    #[serde(default)]
    pub quickbooks: QuickBooksConfig,

    /// LLM settings for the chat endpoint (see `assistant` table in config.toml).
    #[serde(default)]
    pub assistant: AssistantConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variables and the config path each one overrides.
const ENV_KEYS: &[(&str, &str)] = &[
    ("QUICKBOOKS_CLIENT_ID", "quickbooks.client_id"),
    ("QUICKBOOKS_CLIENT_SECRET", "quickbooks.client_secret"),
    ("QUICKBOOKS_REDIRECT_URI", "quickbooks.redirect_uri"),
    ("QUICKBOOKS_API_URL", "quickbooks.api_url"),
    ("QUICKBOOKS_AUTH_URL", "quickbooks.auth_url"),
    ("QUICKBOOKS_TOKEN_URL", "quickbooks.token_url"),
    ("QUICKBOOKS_OAUTH_STATE", "quickbooks.oauth_state"),
    ("ANTHROPIC_API_KEY", "assistant.api_key"),
    ("ANTHROPIC_API_URL", "assistant.api_url"),
    ("ANTHROPIC_MODEL", "assistant.model"),
    ("ALLOWED_ORIGINS", "basic.allowed_origins"),
    ("FRONTEND_URL", "basic.frontend_url"),
    ("LOG_LEVEL", "basic.loglevel"),
    ("LISTEN_ADDR", "basic.listen_addr"),
    ("PORT", "basic.listen_port"),
    ("MCP_STDIO", "basic.mcp_stdio"),
];

impl Config {
    /// Builds a Figment that merges defaults, `config.toml` when present, then the environment.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Self::env_provider())
    }

    fn env_provider() -> Env {
        Env::raw().filter_map(|key| {
            ENV_KEYS
                .iter()
                .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
                .map(|(_, path)| (*path).into())
        })
    }

    /// Extracts configuration from `figment` and validates required fields.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let cfg: Self = figment
            .extract()
            .map_err(|err| ConfigError::Extract(Box::new(err)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads configuration from defaults, optional `config.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Rejects configurations that cannot complete an OAuth exchange or build the CORS layer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let qb = &self.quickbooks;
        let required = [
            ("QUICKBOOKS_CLIENT_ID", qb.client_id.as_str()),
            ("QUICKBOOKS_CLIENT_SECRET", qb.client_secret.as_str()),
            ("QUICKBOOKS_REDIRECT_URI", qb.redirect_uri.as_str()),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing.join(", ")));
        }
        url::Url::parse(qb.redirect_uri.trim()).map_err(|source| ConfigError::InvalidUrl {
            field: "QUICKBOOKS_REDIRECT_URI",
            source,
        })?;
        if self.basic.allowed_origins.iter().any(|o| o.trim() == "*") {
            return Err(ConfigError::WildcardOrigin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment_from(toml: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
    }

    const CREDENTIALS: &str = r#"
        [quickbooks]
        client_id = "ABcd123"
        client_secret = "s3cr3t"
        redirect_uri = "http://localhost:3001/api/auth/callback"
    "#;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::from_figment(&figment_from(CREDENTIALS)).expect("valid config");
        assert_eq!(cfg.basic.listen_port, 3001);
        assert_eq!(cfg.basic.loglevel, "info");
        assert!(cfg.basic.mcp_stdio);
        assert_eq!(
            cfg.basic.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert_eq!(
            cfg.quickbooks.api_url.as_str(),
            "https://sandbox-quickbooks.api.intuit.com/"
        );
        assert_eq!(
            cfg.quickbooks.token_url.as_str(),
            "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer"
        );
        assert_eq!(cfg.quickbooks.oauth_state, "quickbooks-bridge");
        assert_eq!(cfg.assistant.model, "claude-3-5-sonnet-20241022");
        assert!(cfg.assistant.api_key().is_none());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = Config::from_figment(&figment_from(
            r#"
            [quickbooks]
            client_id = "ABcd123"
            "#,
        ))
        .expect_err("missing secret and redirect must fail");
        match err {
            ConfigError::MissingCredentials(names) => {
                assert!(names.contains("QUICKBOOKS_CLIENT_SECRET"));
                assert!(names.contains("QUICKBOOKS_REDIRECT_URI"));
                assert!(!names.contains("QUICKBOOKS_CLIENT_ID"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let err = Config::from_figment(&figment_from(
            r#"
            [quickbooks]
            client_id = "  "
            client_secret = "s"
            redirect_uri = "http://localhost:3001/api/auth/callback"
            "#,
        ))
        .expect_err("blank client id must fail");
        assert!(matches!(err, ConfigError::MissingCredentials(ref n) if n == "QUICKBOOKS_CLIENT_ID"));
    }

    #[test]
    fn allowed_origins_accept_comma_separated_string() {
        let toml = format!(
            "{CREDENTIALS}\n[basic]\nallowed_origins = \"https://app.example.com, http://localhost:4000 ,\"\n"
        );
        let cfg = Config::from_figment(&figment_from(&toml)).expect("valid config");
        assert_eq!(
            cfg.basic.allowed_origins,
            vec!["https://app.example.com", "http://localhost:4000"]
        );
    }

    #[test]
    fn wildcard_origin_is_rejected() {
        let toml = format!("{CREDENTIALS}\n[basic]\nallowed_origins = \"http://localhost:3000,*\"\n");
        let err = Config::from_figment(&figment_from(&toml)).expect_err("wildcard must fail");
        assert!(matches!(err, ConfigError::WildcardOrigin));
    }

    #[test]
    fn numeric_client_id_is_accepted() {
        let cfg = Config::from_figment(&figment_from(
            r#"
            [quickbooks]
            client_id = 12345
            client_secret = "s"
            redirect_uri = "http://localhost:3001/api/auth/callback"
            "#,
        ))
        .expect("valid config");
        assert_eq!(cfg.quickbooks.client_id, "12345");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut cfg = Config::default();
        cfg.quickbooks.client_secret = "s3cr3t".to_string();
        cfg.assistant.api_key = Some("sk-ant-xyz".to_string());
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("s3cr3t"));
        assert!(!dbg.contains("sk-ant-xyz"));
        assert!(dbg.contains("<redacted>"));
    }
}
