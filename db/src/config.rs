//! Connection configuration for the question store.
//!
//! Defines the YAML-serializable settings needed to reach the database.
//! The mapping always has exactly four keys.
//!
//! # Example YAML
//!
//! ```yaml
//! database: /var/lib/forum/forum.db
//! prefix: forum_
//! pool_size: 4
//! busy_timeout_ms: 5000
//! ```
//!
//! Values loaded from a file can be overridden from the environment with
//! `FORUM_DATABASE`, `FORUM_PREFIX`, `FORUM_POOL_SIZE` and
//! `FORUM_BUSY_TIMEOUT_MS`.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Environment variable overriding [`DatabaseConfig::database`].
pub const ENV_DATABASE: &str = "FORUM_DATABASE";
/// Environment variable overriding [`DatabaseConfig::prefix`].
pub const ENV_PREFIX: &str = "FORUM_PREFIX";
/// Environment variable overriding [`DatabaseConfig::pool_size`].
pub const ENV_POOL_SIZE: &str = "FORUM_POOL_SIZE";
/// Environment variable overriding [`DatabaseConfig::busy_timeout_ms`].
pub const ENV_BUSY_TIMEOUT_MS: &str = "FORUM_BUSY_TIMEOUT_MS";

const DEFAULT_PREFIX: &str = "forum_";
const DEFAULT_POOL_SIZE: u32 = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns `true` if `prefix` is non-empty and contains only ASCII
/// alphanumerics and underscores, making it safe to splice into table names.
///
/// # Examples
///
/// ```
/// use forum_db::is_valid_prefix;
///
/// assert!(is_valid_prefix("forum_"));
/// assert!(!is_valid_prefix("x; DROP TABLE users"));
/// assert!(!is_valid_prefix(""));
/// ```
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Settings for reaching the question store.
///
/// # Examples
///
/// ```
/// use forum_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("forum.db");
/// assert_eq!(config.prefix, "forum_");
/// assert_eq!(config.keys().len(), 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the database file.
    pub database: PathBuf,
    /// Prefix prepended to every table and index name.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Creates a configuration for `database` with default settings.
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            prefix: default_prefix(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Replaces the table prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replaces the maximum pool size.
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// read, or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading database config");
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Unset variables leave the current value in place.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOverride`](ConfigError::InvalidOverride) when a
    /// numeric override does not parse.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = PathBuf::from(database);
        }
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.prefix = prefix;
        }
        if let Some(raw) = lookup(ENV_POOL_SIZE) {
            self.pool_size = raw.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                var: ENV_POOL_SIZE,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms =
                raw.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                    var: ENV_BUSY_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
        }
        Ok(self)
    }

    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database path cannot be empty".into()));
        }
        if !is_valid_prefix(&self.prefix) {
            return Err(ConfigError::Invalid(format!(
                "prefix '{}' must contain only alphanumeric characters and underscores",
                self.prefix
            )));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns the key names of the serialized mapping.
    pub fn keys(&self) -> Vec<String> {
        match serde_yaml::to_value(self) {
            Ok(serde_yaml::Value::Mapping(map)) => map
                .keys()
                .filter_map(|k| k.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Busy timeout as a [`Duration`].
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
