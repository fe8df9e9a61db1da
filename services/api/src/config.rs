//! Server settings for the incentive service

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Listener settings, read from `API_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `API_BIND_ADDR`
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:3001")?
            .add_source(Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }
}
