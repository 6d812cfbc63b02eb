//! Application configuration lookup.
//!
//! # Responsibility
//! - Resolve which logical database the application binds records to.
//! - Declare how each logical database is opened.
//!
//! # Invariants
//! - `application.database` is non-empty after a successful load.
//! - Config is read once at start-up and never re-read mid-request.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::LoggingSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Path value that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    EmptyDatabaseName,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::EmptyDatabaseName => write!(f, "application.database cannot be empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::EmptyDatabaseName => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level application config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub application: ApplicationSection,
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseSettings>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `application` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationSection {
    /// Logical database name records are bound to.
    pub database: String,
}

/// Connection settings for one logical database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:`.
    pub path: String,
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

impl DatabaseSettings {
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY_PATH.to_string(),
            busy_timeout_ms: None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT)
    }
}

impl AppConfig {
    /// Builds a config with a single in-memory database named `database`.
    pub fn in_memory(database: impl Into<String>) -> Self {
        let database = database.into();
        let mut databases = BTreeMap::new();
        databases.insert(database.clone(), DatabaseSettings::in_memory());
        Self {
            application: ApplicationSection { database },
            databases,
            logging: LoggingSettings::default(),
        }
    }

    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Logical database name bound to the application.
    pub fn database_name(&self) -> &str {
        &self.application.database
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.application.database.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError};
    use std::time::Duration;

    #[test]
    fn parses_application_database_and_settings() {
        let config = AppConfig::from_json_str(
            r#"{
                "application": { "database": "production" },
                "databases": {
                    "production": { "path": "/var/lib/app.db", "busy_timeout_ms": 250 }
                },
                "logging": { "level": "warn", "dir": "/var/log/app" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.database_name(), "production");
        let settings = &config.databases["production"];
        assert!(!settings.is_in_memory());
        assert_eq!(settings.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.dir.as_deref(), Some("/var/log/app"));
    }

    #[test]
    fn databases_section_is_optional() {
        let config =
            AppConfig::from_json_str(r#"{ "application": { "database": "dev" } }"#).unwrap();
        assert!(config.databases.is_empty());
        assert_eq!(config.logging.dir, None);
    }

    #[test]
    fn rejects_blank_database_name() {
        let err = AppConfig::from_json_str(r#"{ "application": { "database": "  " } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDatabaseName));
    }

    #[test]
    fn in_memory_helper_declares_the_bound_database() {
        let config = AppConfig::in_memory("test");
        assert_eq!(config.database_name(), "test");
        assert!(config.databases["test"].is_in_memory());
    }
}
