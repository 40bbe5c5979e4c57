//! Server configuration loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {key}='{value}': {reason}")]
    Parse {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Prefix every route is mounted under, e.g. `/v2`. Empty for the root.
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            base_path: "/v2".to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `PETSTORE_HOST`, `PORT` and `PETSTORE_BASE_PATH`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = match lookup("PETSTORE_HOST").filter(|v| !v.is_empty()) {
            Some(value) => parse("PETSTORE_HOST", value)?,
            None => defaults.host,
        };
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(value) => parse("PORT", value)?,
            None => defaults.port,
        };
        let base_path = lookup("PETSTORE_BASE_PATH").unwrap_or(defaults.base_path);
        Ok(Self {
            host,
            port,
            base_path,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T>(key: &str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Parse {
        key: key.to_string(),
        reason: e.to_string(),
        value,
    })
}
