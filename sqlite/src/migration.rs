//! Migration lifecycle operations for the forum schema.
//!
//! Provides [`Migration`] for creating, dropping, seeding, and refreshing
//! the five forum tables. All mutation operations use transactions to
//! ensure atomicity.
//!
//! # Example
//!
//! ```no_run
//! use forum_db::DatabaseConfig;
//! use forum_sqlite::{Migration, create_pool};
//!
//! let config = DatabaseConfig::new("forum.db");
//! let pool = create_pool(&config).unwrap();
//! let migration = Migration::new(pool, &config.prefix).unwrap();
//!
//! // Create tables
//! migration.up().unwrap();
//!
//! // Check status
//! let status = migration.status().unwrap();
//! assert!(status.tables_exist);
//!
//! // Seed from a JSON fixture
//! migration.seed("fixtures/forum.json").unwrap();
//!
//! // Drop and recreate
//! migration.refresh("fixtures/forum.json").unwrap();
//! ```

use std::path::Path;

use forum_core::{ForumFixture, ValidationError, validate_fixture};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::convert;
use crate::error::{Result, SqliteError};
use crate::pool::{DbPool, checkout};
use crate::schema::{TABLE_NAMES, generate_drop_sql, generate_schema_sql, validate_prefix};

/// Manages the lifecycle of the forum tables.
///
/// Provides operations to create tables ([`up`](Self::up)), drop them
/// ([`down`](Self::down)), seed data from a JSON fixture
/// ([`seed`](Self::seed)), and check the current migration status
/// ([`status`](Self::status)).
#[derive(Clone)]
pub struct Migration {
    pool: DbPool,
    prefix: String,
}

impl Migration {
    /// Creates a migration manager for the given pool and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(pool: DbPool, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { pool, prefix })
    }

    /// Creates all forum tables and indexes.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` so it is safe to call multiple times.
    pub fn up(&self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let mut conn = checkout(&self.pool)?;
        let tx = conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "forum tables created");
        Ok(())
    }

    /// Drops all forum tables in reverse dependency order.
    ///
    /// Uses `DROP TABLE IF EXISTS` so it is safe to call even if tables
    /// do not exist.
    pub fn down(&self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let mut conn = checkout(&self.pool)?;
        let tx = conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "forum tables dropped");
        Ok(())
    }

    /// Returns whether the tables exist and how many rows each holds.
    pub fn status(&self) -> Result<MigrationStatus> {
        if !self.tables_exist()? {
            return Ok(MigrationStatus::default());
        }

        Ok(MigrationStatus {
            tables_exist: true,
            user_count: self.count_rows("users")?,
            question_count: self.count_rows("questions")?,
            answer_count: self.count_rows("answers")?,
            vote_count: self.count_rows("votes")?,
            comment_count: self.count_rows("comments")?,
        })
    }

    /// Seeds the database from a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::FixtureError`] if the file cannot be read or
    /// parsed, or fails validation.
    pub fn seed(&self, fixture_path: impl AsRef<Path>) -> Result<SeedReport> {
        let path = fixture_path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SqliteError::FixtureError(format!("failed to read '{}': {e}", path.display()))
        })?;
        let fixture: ForumFixture = serde_json::from_str(&text).map_err(|e| {
            SqliteError::FixtureError(format!("failed to parse '{}': {e}", path.display()))
        })?;
        self.seed_fixture(&fixture)
    }

    /// Inserts every row of `fixture` within a single transaction.
    ///
    /// Parents are inserted before children. A row may also reference a
    /// user, question or answer already stored in the database, so a
    /// fixture can extend earlier seed data.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::FixtureError`] for duplicate keys or for a
    /// parent found neither in the fixture nor in the database. Nothing
    /// is inserted in that case.
    pub fn seed_fixture(&self, fixture: &ForumFixture) -> Result<SeedReport> {
        let mut conn = checkout(&self.pool)?;
        let tx = conn.transaction()?;

        let mut unresolved = Vec::new();
        for err in validate_fixture(fixture) {
            if let ValidationError::DanglingReference {
                parent, parent_id, ..
            } = &err
            {
                if self.parent_is_stored(&tx, parent, *parent_id)? {
                    continue;
                }
            }
            unresolved.push(err.to_string());
        }
        if !unresolved.is_empty() {
            return Err(SqliteError::FixtureError(unresolved.join("; ")));
        }

        let mut report = SeedReport::default();

        for user in &fixture.users {
            convert::insert_user(&tx, &self.prefix, user)?;
            report.users_inserted += 1;
        }
        for question in &fixture.questions {
            convert::insert_question(&tx, &self.prefix, question)?;
            report.questions_inserted += 1;
        }
        for answer in &fixture.answers {
            convert::insert_answer(&tx, &self.prefix, answer)?;
            report.answers_inserted += 1;
        }
        for vote in &fixture.votes {
            convert::insert_vote(&tx, &self.prefix, vote)?;
            report.votes_inserted += 1;
        }
        for comment in &fixture.comments {
            convert::insert_comment(&tx, &self.prefix, comment)?;
            report.comments_inserted += 1;
        }

        tx.commit()?;
        debug!(rows = report.total(), "fixture seeded");
        Ok(report)
    }

    /// Drops all tables, recreates them, and seeds from the given fixture.
    pub fn refresh(&self, fixture_path: impl AsRef<Path>) -> Result<SeedReport> {
        self.down()?;
        self.up()?;
        self.seed(fixture_path)
    }

    /// Returns the pool this migration runs on.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Returns the table prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Checks whether the parent row a fixture references is already stored.
    fn parent_is_stored(&self, conn: &Connection, parent: &str, id: i64) -> Result<bool> {
        let (table, key) = match parent {
            "user" => ("users", "user_id"),
            "question" => ("questions", "question_id"),
            "answer" => ("answers", "answer_id"),
            _ => return Ok(false),
        };
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM {}{table} WHERE {key} = ?1", self.prefix),
                [id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Checks whether all five forum tables exist.
    fn tables_exist(&self) -> Result<bool> {
        let conn = checkout(&self.pool)?;
        let mut stmt =
            conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        for table in TABLE_NAMES {
            let name = format!("{}{}", self.prefix, table);
            let count: i64 = stmt.query_row([&name], |row| row.get(0))?;
            if count == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Counts rows in a prefixed table.
    fn count_rows(&self, table: &str) -> Result<usize> {
        let conn = checkout(&self.pool)?;
        let full_table = format!("{}{}", self.prefix, table);
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {full_table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }
}

/// Snapshot returned by [`Migration::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Whether all five forum tables exist.
    pub tables_exist: bool,
    pub user_count: usize,
    pub question_count: usize,
    pub answer_count: usize,
    pub vote_count: usize,
    pub comment_count: usize,
}

/// Rows inserted by [`Migration::seed`] and [`Migration::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users_inserted: usize,
    pub questions_inserted: usize,
    pub answers_inserted: usize,
    pub votes_inserted: usize,
    pub comments_inserted: usize,
}

impl SeedReport {
    /// Total rows inserted across all tables.
    pub fn total(&self) -> usize {
        self.users_inserted
            + self.questions_inserted
            + self.answers_inserted
            + self.votes_inserted
            + self.comments_inserted
    }
}
