//! Configuration loading and representation.
//!
//! All settings come from environment variables. Unset variables fall back to
//! development defaults; set-but-malformed variables are an error.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use crate::ledger::DEFAULT_MAX_ATTEMPTS;

pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not valid: {reason} (got '{value}')")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local store; data is lost on restart.
    InMemory,
    Sqlite {
        url: String,
        max_connections: u32,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub store: StoreConfig,
    pub ledger_max_attempts: u32,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("store", &self.store)
            .field("ledger_max_attempts", &self.ledger_max_attempts)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl: Duration::minutes(60),
            store: StoreConfig::InMemory,
            ledger_max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("BIND_ADDR", &v, format!("{e}")))?,
            None => defaults.bind_addr,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let session_ttl = match get("SESSION_TTL_MINUTES") {
            Some(v) => {
                let minutes = parse_positive("SESSION_TTL_MINUTES", &v)?;
                Duration::minutes(i64::from(minutes))
            }
            None => defaults.session_ttl,
        };

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => parse_positive("DB_MAX_CONNECTIONS", &v)?,
            None => 5,
        };
        let store = match get("DATABASE_URL") {
            Some(url) if url.starts_with("sqlite:") => StoreConfig::Sqlite {
                url,
                max_connections,
            },
            Some(url) => {
                return Err(ConfigError::invalid(
                    "DATABASE_URL",
                    &url,
                    "only sqlite: URLs are supported",
                ))
            }
            None => StoreConfig::InMemory,
        };

        let ledger_max_attempts = match get("LEDGER_MAX_ATTEMPTS") {
            Some(v) => parse_positive("LEDGER_MAX_ATTEMPTS", &v)?,
            None => defaults.ledger_max_attempts,
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            None => defaults.log_format,
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(v) => return Err(ConfigError::invalid("LOG_FORMAT", &v, "expected json or pretty")),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            session_ttl,
            store,
            ledger_max_attempts,
            log_format,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::invalid(name, value, "must be at least 1")),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::invalid(name, value, e.to_string())),
    }
}
