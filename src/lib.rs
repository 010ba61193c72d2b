pub mod assistant;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod mcp;
mod oauth_utils;
pub mod quickbooks;
pub mod server;
mod utils;

pub use bootstrap::Services;
pub use error::BridgeError;
