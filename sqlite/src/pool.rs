//! Process-wide connection pool.
//!
//! Built once at startup from a [`DatabaseConfig`] and shared by cloning
//! the handle. Every connection the pool opens enables foreign keys, sets
//! the busy timeout and switches the file to WAL mode.

use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info};

use forum_db::DatabaseConfig;

use crate::error::Result;

/// Shared pool of SQLite connections.
pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// A connection checked out of a [`DbPool`]; returned to the pool on drop.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Creates a connection pool for the configured database file.
///
/// # Errors
///
/// Returns [`ConfigError`](crate::SqliteError::ConfigError) if the config
/// does not validate, or [`PoolError`](crate::SqliteError::PoolError) if
/// the initial connections cannot be opened.
pub fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    config.validate()?;

    let busy_timeout = config.busy_timeout();
    let manager = SqliteConnectionManager::file(&config.database).with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)?;

    info!(
        database = %config.database.display(),
        pool_size = config.pool_size,
        "connection pool ready"
    );
    Ok(pool)
}

/// Checks a connection out of the pool.
pub(crate) fn checkout(pool: &DbPool) -> Result<PooledConnection> {
    let state = pool.state();
    debug!(
        connections = state.connections,
        idle = state.idle_connections,
        "checking out connection"
    );
    Ok(pool.get()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_connections_enforce_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::new(dir.path().join("forum.db")).with_pool_size(2);
        let pool = create_pool(&config).unwrap();

        let conn = checkout(&pool).unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_invalid_config_rejected_before_connecting() {
        let config = DatabaseConfig::new("forum.db").with_prefix("no spaces");
        let err = create_pool(&config).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
