//! Application error types.

use store::StoreError;
use thiserror::Error;

/// An environment variable held a value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Errors that can occur while starting the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The database could not be reached or migrated.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Signal handlers could not be installed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging or metrics could not be installed.
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
