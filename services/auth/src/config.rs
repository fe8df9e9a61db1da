//! Settings for the authentication service

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Listener settings, read from `AUTH_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `AUTH_BIND_ADDR`
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")?
            .add_source(Environment::with_prefix("AUTH"))
            .build()?
            .try_deserialize()
    }
}

/// Credentials of the super admin created on first start, from `SUPER_ADMIN_*`
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl BootstrapConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("SUPER_ADMIN"))
            .build()?
            .try_deserialize()
    }

    /// Username, password and display name when both credentials are set
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        let name = self.name.as_deref().unwrap_or("Super Administrator");
        Some((username, password, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn bind_addr_defaults_and_overrides() {
        unsafe { env::remove_var("AUTH_BIND_ADDR") };
        assert_eq!(ServerConfig::load().unwrap().bind_addr, "0.0.0.0:3000");

        unsafe { env::set_var("AUTH_BIND_ADDR", "127.0.0.1:9000") };
        assert_eq!(ServerConfig::load().unwrap().bind_addr, "127.0.0.1:9000");
        unsafe { env::remove_var("AUTH_BIND_ADDR") };
    }

    #[test]
    #[serial]
    fn bootstrap_needs_username_and_password() {
        unsafe {
            env::set_var("SUPER_ADMIN_USERNAME", "root");
            env::remove_var("SUPER_ADMIN_PASSWORD");
            env::remove_var("SUPER_ADMIN_NAME");
        }
        assert!(BootstrapConfig::load().unwrap().credentials().is_none());

        unsafe { env::set_var("SUPER_ADMIN_PASSWORD", "Root#Pass1") };
        let config = BootstrapConfig::load().unwrap();
        assert_eq!(
            config.credentials(),
            Some(("root", "Root#Pass1", "Super Administrator"))
        );

        unsafe {
            env::remove_var("SUPER_ADMIN_USERNAME");
            env::remove_var("SUPER_ADMIN_PASSWORD");
        }
    }
}
