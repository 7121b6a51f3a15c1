use crate::{ConfigError, FromEnv, env_parse};
use std::net::Ipv4Addr;

pub const DEFAULT_PORT: u16 = 8080;

/// Listen address of the HTTP API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, as passed to the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `HOST` (default `0.0.0.0`) and `PORT` (default 8080)
impl FromEnv for ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host: String = env_parse("HOST", defaults.host)?;
        if host.is_empty() {
            return Err(ConfigError::ParseError {
                key: "HOST".to_string(),
                details: "must not be blank".to_string(),
            });
        }

        Ok(Self {
            host,
            port: env_parse("PORT", defaults.port)?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), DEFAULT_PORT)
    }
}
