//! Error types for fare-quote.

use railfare_core::CoreError;
use railfare_db::DbError;

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced to the command line.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}\n\nRun `fare-quote --help` for usage.")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Fare(#[from] CoreError),

    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }
}

pub type CliResult<T> = Result<T, CliError>;
