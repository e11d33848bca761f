//! SQL schema generation with customizable table prefixes.
//!
//! Generates the `CREATE TABLE` and `CREATE INDEX` statements for the five
//! forum tables. All table names are prefixed with a configurable string so
//! several isolated forums (e.g. `prod_`, `test_`) can share one database.
//!
//! # Table structure
//!
//! - `{prefix}users`: account name and credentials
//! - `{prefix}questions`: title, body, author
//! - `{prefix}answers`: answers posted to a question
//! - `{prefix}votes`: one up/down vote per user per answer
//! - `{prefix}comments`: comments posted to an answer
//!
//! Every child table cascades deletes from its parent, so removing a
//! question removes its answers, their votes and their comments.

use crate::error::{Result, SqliteError};

/// Unprefixed table names in dependency order (parents first).
pub const TABLE_NAMES: [&str; 5] = ["users", "questions", "answers", "votes", "comments"];

/// Store-side timestamp expression with millisecond precision.
pub(crate) const NOW_EXPR: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if !forum_db::is_valid_prefix(prefix) {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates one `CREATE TABLE` statement per forum table, in dependency
/// order.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains characters
/// other than alphanumerics and underscores, or if it is empty.
pub fn create_table_statements(prefix: &str) -> Result<Vec<String>> {
    validate_prefix(prefix)?;

    let now = NOW_EXPR;
    Ok(vec![
        format!(
            r#"CREATE TABLE IF NOT EXISTS {prefix}users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    password TEXT,
    created_at TEXT NOT NULL DEFAULT ({now})
);"#
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {prefix}questions (
    question_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT ({now}),
    FOREIGN KEY (user_id) REFERENCES {prefix}users(user_id) ON DELETE CASCADE
);"#
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {prefix}answers (
    answer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    answer_body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT ({now}),
    FOREIGN KEY (question_id) REFERENCES {prefix}questions(question_id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES {prefix}users(user_id) ON DELETE CASCADE
);"#
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {prefix}votes (
    vote_id INTEGER PRIMARY KEY AUTOINCREMENT,
    answer_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    vote INTEGER NOT NULL CHECK (vote IN (0, 1)),
    UNIQUE (answer_id, user_id),
    FOREIGN KEY (answer_id) REFERENCES {prefix}answers(answer_id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES {prefix}users(user_id) ON DELETE CASCADE
);"#
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {prefix}comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    answer_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT ({now}),
    FOREIGN KEY (answer_id) REFERENCES {prefix}answers(answer_id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES {prefix}users(user_id) ON DELETE CASCADE
);"#
        ),
    ])
}

/// Generates the secondary indexes backing the correlated lookups.
pub fn create_index_statements(prefix: &str) -> Result<Vec<String>> {
    validate_prefix(prefix)?;

    Ok(vec![
        format!("CREATE INDEX IF NOT EXISTS idx_{prefix}questions_user ON {prefix}questions(user_id);"),
        format!("CREATE INDEX IF NOT EXISTS idx_{prefix}questions_created ON {prefix}questions(created_at);"),
        format!("CREATE INDEX IF NOT EXISTS idx_{prefix}answers_question ON {prefix}answers(question_id);"),
        format!("CREATE INDEX IF NOT EXISTS idx_{prefix}votes_answer ON {prefix}votes(answer_id);"),
        format!("CREATE INDEX IF NOT EXISTS idx_{prefix}comments_answer ON {prefix}comments(answer_id);"),
    ])
}

/// Generates the complete SQL schema (tables, then indexes) for the prefix.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    let mut statements = create_table_statements(prefix)?;
    statements.extend(create_index_statements(prefix)?);
    Ok(statements.join("\n\n"))
}

/// Generates SQL to drop all forum tables in reverse dependency order.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = TABLE_NAMES
        .iter()
        .rev()
        .map(|table| format!("DROP TABLE IF EXISTS {prefix}{table};"))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(sql)
}
