//! SQLite storage backend for the forum question store.
//!
//! This crate provides the five-table forum schema, its migration
//! lifecycle, a shared connection pool, and [`QuestionRepository`], the
//! data-access layer request handlers call to manage questions.
//!
//! # Architecture
//!
//! The crate is organized into six modules:
//!
//! - **`schema`**: SQL generation with customizable table prefixes
//! - **`migration`**: Lifecycle operations (up/down/seed/refresh/status)
//! - **`pool`**: `r2d2` pool with per-connection pragmas
//! - **`convert`**: Row ↔ record mapping and fixture inserts
//! - **`repository`**: Question CRUD and read aggregates
//! - **`error`**: [`SqliteError`] and its [`ErrorKind`]
//!
//! # Quick start: migrations
//!
//! ```no_run
//! use forum_db::DatabaseConfig;
//! use forum_sqlite::{Migration, create_pool};
//!
//! let config = DatabaseConfig::new("forum.db");
//! let pool = create_pool(&config).unwrap();
//! let migration = Migration::new(pool, &config.prefix).unwrap();
//!
//! migration.up().unwrap();
//! let status = migration.status().unwrap();
//! println!("Questions: {}", status.question_count);
//! ```
//!
//! # Quick start: questions
//!
//! ```no_run
//! use forum_core::{QuestionId, UserId};
//! use forum_db::DatabaseConfig;
//! use forum_sqlite::{QuestionRepository, create_pool};
//!
//! let config = DatabaseConfig::new("forum.db");
//! let repo = QuestionRepository::new(create_pool(&config).unwrap(), &config.prefix).unwrap();
//!
//! for q in repo.list(Some("lifetime")).unwrap() {
//!     println!("{} ({} answers)", q.title, q.answers_count);
//! }
//!
//! let detail = repo.get_detail(QuestionId::new(1).unwrap()).unwrap();
//! println!("{} answers", detail.answers.len());
//!
//! let mine = repo.list_by_user(UserId::new(1).unwrap()).unwrap();
//! println!("{} asked", mine.question.len());
//! ```
//!
//! # Table prefix customization
//!
//! All table and index names are prefixed with a configurable string,
//! allowing multiple isolated forums within the same SQLite database.
//! Prefixes must contain only alphanumeric characters and underscores.

mod convert;
mod error;
mod migration;
mod pool;
mod repository;
mod schema;

pub use error::{ErrorKind, Result, SqliteError};
pub use migration::{Migration, MigrationStatus, SeedReport};
pub use pool::{DbPool, PooledConnection, create_pool};
pub use repository::QuestionRepository;
pub use schema::{
    TABLE_NAMES, create_index_statements, create_table_statements, generate_drop_sql,
    generate_schema_sql,
};
