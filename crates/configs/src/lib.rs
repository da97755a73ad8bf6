//! # configs
//!
//! Layered application configuration: compiled defaults, then an optional
//! `reviewd.toml`, then `REVIEWD__`-prefixed environment variables
//! (`REVIEWD__SERVER__PORT=9090`). Secrets are `SecretString` and are
//! never printed by `Debug`.

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the session-issuing auth service signs tokens with.
    pub token_secret: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Only read when the binary is built with `db-postgres`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("auth.token_secret", "dev-secret-change-me")?
            .set_default("pagination.default_page_size", 20)?
            .set_default("pagination.max_page_size", 100)?
            .add_source(File::with_name("reviewd").required(false))
            .add_source(Environment::with_prefix("REVIEWD").separator("__"))
            .build()?;
        let app: AppConfig = config.try_deserialize()?;
        tracing::debug!(
            host = %app.server.host,
            port = app.server.port,
            "configuration loaded"
        );
        Ok(app)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
