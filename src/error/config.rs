use thiserror::Error as ThisError;

/// Startup configuration failures. These abort the process before anything is served.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to extract configuration (defaults + config.toml + env): {0}")]
    Extract(Box<figment::Error>),

    #[error("missing required QuickBooks settings: {0}")]
    MissingCredentials(String),

    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        source: url::ParseError,
    },

    #[error("ALLOWED_ORIGINS cannot contain \"*\"; list each frontend origin explicitly")]
    WildcardOrigin,
}
