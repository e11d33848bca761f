//! Error types for the question store.
//!
//! Provides a unified error type covering database access, the connection
//! pool, row conversion, migrations, configuration and caller input.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// No pooled connection could be checked out.
    #[error("connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    /// Migration lifecycle operation failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Seed fixture could not be read or is inconsistent.
    #[error("fixture error: {0}")]
    FixtureError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Caller-supplied input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] forum_core::ValidationError),

    /// Connection settings are unusable.
    #[error("config error: {0}")]
    ConfigError(#[from] forum_db::ConfigError),
}

/// Coarse classification of a [`SqliteError`], for callers that decide
/// retry or response policy without matching every variant.
///
/// `Conversion` covers database errors raised while mapping a stored
/// value into its record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Database,
    Pool,
    Conversion,
    Migration,
    InvalidInput,
    Config,
}

impl SqliteError {
    /// Returns the coarse kind of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use forum_sqlite::{ErrorKind, SqliteError};
    ///
    /// let err = SqliteError::InvalidPrefix("a-b".into());
    /// assert_eq!(err.kind(), ErrorKind::Config);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(
                rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::IntegralValueOutOfRange(..),
            ) => ErrorKind::Conversion,
            Self::DatabaseError(_) => ErrorKind::Database,
            Self::PoolError(_) => ErrorKind::Pool,
            Self::MigrationError(_) | Self::FixtureError(_) => ErrorKind::Migration,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidPrefix(_) | Self::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` for failures a retry might clear, such as a busy
    /// database or an exhausted pool.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::PoolError(_) => true,
            Self::DatabaseError(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
