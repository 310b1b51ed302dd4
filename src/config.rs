//! Runtime configuration from environment variables.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;

use crate::agent::OllamaConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub ollama: OllamaConfig,
    /// Header carrying the caller identity when a trusted proxy authenticates
    /// requests. Unset means identity comes from the cookie session only.
    pub identity_header: Option<HeaderName>,
    pub secure_cookies: bool,
    pub cache_purge_interval: Duration,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let defaults = OllamaConfig::default();

        let ollama = OllamaConfig {
            base_url: get("OLLAMA_URL").unwrap_or(defaults.base_url),
            model: get("OLLAMA_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(parse(&get, "OLLAMA_TIMEOUT_SECS", 120u64)?),
            system_prompt: get("OLLAMA_SYSTEM_PROMPT"),
            history_limit: parse(&get, "CHAT_HISTORY_LIMIT", defaults.history_limit)?,
        };

        let identity_header = get("IDENTITY_HEADER")
            .map(|value| {
                HeaderName::from_str(value.trim()).map_err(|e| ConfigError::Invalid {
                    key: "IDENTITY_HEADER",
                    value,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let purge_secs: u64 = parse(&get, "CACHE_PURGE_INTERVAL_SECS", 3600)?;
        if purge_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "CACHE_PURGE_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            database_url,
            db_max_connections: parse(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            ollama,
            identity_header,
            secure_cookies: parse(&get, "SECURE_COOKIES", true)?,
            cache_purge_interval: Duration::from_secs(purge_secs),
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
