//! Connection configuration for the forum question store.
//!
//! Loads and validates the settings used to open the database: file
//! path, table prefix, pool size and busy timeout. Settings come from a
//! YAML file with optional environment overrides.
//!
//! # Quick start
//!
//! ```no_run
//! use forum_db::DatabaseConfig;
//!
//! let config = DatabaseConfig::load("forum.yml")
//!     .and_then(DatabaseConfig::apply_env)
//!     .unwrap();
//! config.validate().unwrap();
//! println!("using {}", config.database.display());
//! ```

mod config;
mod error;

pub use config::{
    DatabaseConfig, ENV_BUSY_TIMEOUT_MS, ENV_DATABASE, ENV_POOL_SIZE, ENV_PREFIX, is_valid_prefix,
};
pub use error::{ConfigError, Result};
