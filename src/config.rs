// region:    --- Imports
use std::{env, fmt::Display, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

// endregion: --- Imports

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where ledger rows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Postgres => f.write_str("postgres"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub reset_database: bool,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let store: StoreBackend = try_load("LEDGER_STORE", "postgres")?;
        let database_url = env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            store,
            database_url,
            max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            reset_database: try_load("LEDGER_RESET_DB", "false")?,
            host: try_load("LEDGER_HOST", "0.0.0.0")?,
            port: try_load("LEDGER_PORT", "3000")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{:<12} --> {key} not set, using default: {default}", "Config");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("{:<12} --> Invalid {key} value: {e}", "Config");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("postgres".parse(), Ok(StoreBackend::Postgres));
        assert_eq!(" Memory ".parse(), Ok(StoreBackend::Memory));
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = Config {
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 5,
            reset_database: false,
            host: "127.0.0.1".into(),
            port: 8080,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
