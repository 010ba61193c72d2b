mod bridge;
mod config;
mod oauth;

pub use bridge::{ApiErrorBody, BridgeError};
pub use config::ConfigError;
pub use oauth::OauthError;
