//! Application configuration loaded from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::ConfigError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_FILTER: &str = "info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// Storefront configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string (default: unset, in-memory store)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `METRICS_ADDR`: Prometheus scrape listener address (default: unset, no listener)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_filter: String,
    pub log_format: LogFormat,
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let metrics_addr = get("METRICS_ADDR")
            .map(|raw| {
                raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "METRICS_ADDR",
                    value: raw,
                })
            })
            .transpose()?;

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_max_connections,
            log_filter: get("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_format: get("LOG_FORMAT")
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
            metrics_addr,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Text,
            metrics_addr: None,
        }
    }
}
