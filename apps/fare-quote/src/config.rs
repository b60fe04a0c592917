//! # Quote Tool Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RAILFARE_DB_PATH=/srv/railfare.db                                  │
//! │     RAILFARE_MISSING_RANGE_POLICY=strict                               │
//! │     RAILFARE_LOG=debug                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else                                              │
//! │     ~/.config/railfare/config.toml (Linux)                             │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "railfare.db"
//! max_connections = 5
//! run_migrations = true
//!
//! [pricing]
//! missing_range_policy = "zero_fallback"  # zero_fallback | strict
//!
//! [logging]
//! filter = "info,railfare=debug,sqlx=warn"
//! ```
//!
//! `RUST_LOG`, when set, wins over both the file and `RAILFARE_LOG`.

use railfare_core::MissingRangePolicy;
use railfare_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_LOG_FILTER: &str = "info,railfare=debug,sqlx=warn";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Default: `railfare.db` in the working directory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("railfare.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub missing_range_policy: MissingRangePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// QuoteConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl QuoteConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// file at the platform default location is not.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `RAILFARE_*` overrides read through `var`.
    ///
    /// Runs before tracing is initialized; unusable values are errors.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = var("RAILFARE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(policy) = var("RAILFARE_MISSING_RANGE_POLICY") {
            self.pricing.missing_range_policy = policy.parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "RAILFARE_MISSING_RANGE_POLICY must be zero_fallback or strict, got '{}'",
                    policy
                ))
            })?;
        }

        if let Some(filter) = var("RAILFARE_LOG") {
            self.logging.filter = filter;
        }

        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .run_migrations(self.database.run_migrations)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "railfare")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = QuoteConfig::default();
        assert_eq!(config.database.path, PathBuf::from("railfare.db"));
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.run_migrations);
        assert_eq!(config.pricing.missing_range_policy, MissingRangePolicy::ZeroFallback);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_parse_full_file() {
        let config = QuoteConfig::from_toml(
            r#"
            [database]
            path = "/srv/railfare.db"
            max_connections = 2
            run_migrations = false

            [pricing]
            missing_range_policy = "strict"

            [logging]
            filter = "warn"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/srv/railfare.db"));
        assert_eq!(config.database.max_connections, 2);
        assert!(!config.database.run_migrations);
        assert_eq!(config.pricing.missing_range_policy, MissingRangePolicy::Strict);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = QuoteConfig::from_toml("[pricing]\nmissing_range_policy = \"strict\"\n").unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.pricing.missing_range_policy, MissingRangePolicy::Strict);
    }

    #[test]
    fn test_unknown_policy_is_a_parse_error() {
        let result = QuoteConfig::from_toml("[pricing]\nmissing_range_policy = \"lenient\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RAILFARE_DB_PATH", "/tmp/override.db"),
            ("RAILFARE_MISSING_RANGE_POLICY", "Strict"),
            ("RAILFARE_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = QuoteConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.pricing.missing_range_policy, MissingRangePolicy::Strict);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_bad_env_policy_is_rejected() {
        let mut config = QuoteConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "RAILFARE_MISSING_RANGE_POLICY").then(|| "sometimes".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(ref msg)) if msg.contains("sometimes")));
    }

    #[test]
    fn test_validate() {
        let mut config = QuoteConfig::default();
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.database.max_connections = 1;
        config.database.path = PathBuf::new();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = QuoteConfig::load(Some(PathBuf::from("/nonexistent/railfare/config.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_db_config() {
        let mut config = QuoteConfig::default();
        config.database.max_connections = 3;
        config.database.run_migrations = false;

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("railfare.db"));
        assert_eq!(db.max_connections, 3);
        assert!(!db.run_migrations);
    }
}
