//! Conversion between SQLite rows and forum record types.
//!
//! Row mappers run inside `query_map` callbacks, so they report failures
//! as [`rusqlite::Error`]; a malformed timestamp or a non-positive key
//! becomes a `FromSqlConversionFailure` naming the offending column.
//!
//! The `insert_*` functions write fixture rows with their explicit keys
//! and are used by [`Migration::seed`](crate::Migration::seed).

use chrono::{DateTime, NaiveDateTime, Utc};
use forum_core::{
    AnswerView, Comment, FixtureAnswer, FixtureComment, FixtureQuestion, FixtureUser, FixtureVote,
    QuestionId, QuestionListing, QuestionRecord, UserId,
};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use crate::error::Result;

/// Format produced by the store's `strftime('%Y-%m-%d %H:%M:%f', 'now')`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parses a stored timestamp as UTC.
pub(crate) fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

fn conversion_failure<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| conversion_failure(idx, Type::Text, e))
}

fn question_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<QuestionId> {
    QuestionId::new(row.get(idx)?).map_err(|e| conversion_failure(idx, Type::Integer, e))
}

fn user_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<UserId> {
    UserId::new(row.get(idx)?).map_err(|e| conversion_failure(idx, Type::Integer, e))
}

/// Maps `question_id, title, body, created_at`.
pub(crate) fn question_record(row: &Row<'_>) -> rusqlite::Result<QuestionRecord> {
    Ok(QuestionRecord {
        question_id: question_id_at(row, 0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

/// Maps `question_id, title, body, created_at, username, answers_count`.
pub(crate) fn question_listing(row: &Row<'_>) -> rusqlite::Result<QuestionListing> {
    Ok(QuestionListing {
        question_id: question_id_at(row, 0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
        username: row.get(4)?,
        answers_count: row.get(5)?,
    })
}

/// Maps `answer_id, question_id, answer_body, created_at, username,
/// up_votes, down_votes`.
pub(crate) fn answer_view(row: &Row<'_>) -> rusqlite::Result<AnswerView> {
    Ok(AnswerView {
        answer_id: row.get(0)?,
        question_id: question_id_at(row, 1)?,
        answer_body: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
        username: row.get(4)?,
        up_votes: row.get(5)?,
        down_votes: row.get(6)?,
    })
}

/// Maps `comment_id, answer_id, user_id, body, created_at`.
pub(crate) fn comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        comment_id: row.get(0)?,
        answer_id: row.get(1)?,
        user_id: user_id_at(row, 2)?,
        body: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

/// Inserts a fixture user with its explicit key.
pub fn insert_user(conn: &Connection, prefix: &str, user: &FixtureUser) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO {prefix}users (user_id, username, email, password) VALUES (?1, ?2, ?3, ?4)"),
        params![user.user_id, user.username, user.email, user.password],
    )?;
    Ok(())
}

/// Inserts a fixture question with its explicit key.
pub fn insert_question(conn: &Connection, prefix: &str, question: &FixtureQuestion) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO {prefix}questions (question_id, title, body, user_id) VALUES (?1, ?2, ?3, ?4)"),
        params![
            question.question_id,
            question.title,
            question.body,
            question.user_id
        ],
    )?;
    Ok(())
}

/// Inserts a fixture answer with its explicit key.
pub fn insert_answer(conn: &Connection, prefix: &str, answer: &FixtureAnswer) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {prefix}answers (answer_id, question_id, user_id, answer_body) VALUES (?1, ?2, ?3, ?4)"
        ),
        params![
            answer.answer_id,
            answer.question_id,
            answer.user_id,
            answer.answer_body
        ],
    )?;
    Ok(())
}

/// Inserts a fixture vote.
pub fn insert_vote(conn: &Connection, prefix: &str, vote: &FixtureVote) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO {prefix}votes (answer_id, user_id, vote) VALUES (?1, ?2, ?3)"),
        params![vote.answer_id, vote.user_id, vote.vote],
    )?;
    Ok(())
}

/// Inserts a fixture comment with its explicit key.
pub fn insert_comment(conn: &Connection, prefix: &str, comment: &FixtureComment) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {prefix}comments (comment_id, answer_id, user_id, body) VALUES (?1, ?2, ?3, ?4)"
        ),
        params![
            comment.comment_id,
            comment.answer_id,
            comment.user_id,
            comment.body
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_store_timestamp() {
        let ts = parse_timestamp("2026-03-14 15:09:26.535").unwrap();
        assert_eq!(ts.year(), 2026);
        assert_eq!(ts.hour(), 15);
        assert_eq!(ts.timestamp_subsec_millis(), 535);
    }

    #[test]
    fn test_parse_timestamp_without_fraction() {
        assert!(parse_timestamp("2026-03-14 15:09:26").is_ok());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_malformed_row_surfaces_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 1, 't', 'b', 'not a time'", [], question_record)
            .unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, _)
        ));

        let err = conn
            .query_row("SELECT 0, 't', 'b', '2026-01-01 00:00:00.000'", [], question_record)
            .unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, _)
        ));
    }

    #[test]
    fn test_listing_with_null_username() {
        let conn = Connection::open_in_memory().unwrap();
        let listing = conn
            .query_row(
                "SELECT 4, 't', 'b', '2026-01-01 00:00:00.000', NULL, 2",
                [],
                question_listing,
            )
            .unwrap();
        assert_eq!(listing.question_id.get(), 4);
        assert!(listing.username.is_none());
        assert_eq!(listing.answers_count, 2);
    }
}
