//! Environment configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Which progress store backs the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Postgres { database_url: String },
    Memory { seed: Option<PathBuf> },
}

/// Server configuration read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Config {
    /// Load from process environment (after `.env` has been read)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE").as_deref().unwrap_or("postgres") {
            "postgres" => StoreKind::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ApiError::Config("DATABASE_URL must be set".to_string()))?,
            },
            "memory" => StoreKind::Memory {
                seed: lookup("MEMORY_SEED").map(PathBuf::from),
            },
            other => {
                return Err(ApiError::Config(format!("Unknown STORE: {}", other)));
            }
        };

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;
        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        let acquire_timeout = Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?);

        Ok(Self {
            store,
            host,
            port,
            max_connections,
            acquire_timeout,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Config(format!("Invalid {}: {}", key, raw))),
        None => Ok(default),
    }
}
