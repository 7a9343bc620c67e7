use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {message}")]
    Io { path: String, message: String },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Connection settings handed to the store adapter. The core treats them as
/// an opaque handle; only the adapter reads them.
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct StoreConfig {
    #[validate(length(min = 1, message = "store URL cannot be empty"))]
    pub url: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[validate(length(min = 1, message = "database cannot be empty"))]
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_user() -> String {
    "default".to_string()
}

fn default_database() -> String {
    "default".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
        }
    }
}

impl StoreConfig {
    /// Read `CLICKHOUSE_*` variables, loading a `.env` file first when one
    /// is present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            url: env::var("CLICKHOUSE_URL").unwrap_or(defaults.url),
            user: env::var("CLICKHOUSE_USER").unwrap_or(defaults.user),
            password: env::var("CLICKHOUSE_PASSWORD").unwrap_or(defaults.password),
            database: env::var("CLICKHOUSE_DATABASE").unwrap_or(defaults.database),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
