//! Question lifecycle and read-side aggregates.
//!
//! Provides [`QuestionRepository`], the single entry point a request
//! handler uses to create, list, inspect, edit and delete questions.
//! Every call checks a connection out of the shared pool, runs one
//! statement (or a short fixed sequence of them) with all caller values
//! bound as parameters, and returns the connection when it goes out of
//! scope. No call opens a transaction spanning statements.
//!
//! # Example
//!
//! ```no_run
//! use forum_core::{DeleteOutcome, UserId};
//! use forum_db::DatabaseConfig;
//! use forum_sqlite::{QuestionRepository, create_pool};
//!
//! let config = DatabaseConfig::new("forum.db");
//! let pool = create_pool(&config).unwrap();
//! let repo = QuestionRepository::new(pool, &config.prefix).unwrap();
//!
//! let author = UserId::new(1).unwrap();
//! let created = repo.create("Borrowing", "Why does this move?", author).unwrap();
//!
//! let detail = repo.get_detail(created.question_id).unwrap();
//! assert_eq!(detail.question[0].title, "Borrowing");
//!
//! assert_eq!(repo.delete(created.question_id, author).unwrap(), DeleteOutcome::Deleted);
//! ```

use forum_core::{
    AnswerView, Comment, DeleteOutcome, QuestionDetail, QuestionId, QuestionListing,
    QuestionRecord, UserId, UserQuestions, validate_text,
};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, error, warn};

use crate::convert;
use crate::error::Result;
use crate::pool::{DbPool, PooledConnection, checkout};
use crate::schema::validate_prefix;

/// Data-access layer for the questions table.
///
/// Cheap to clone: clones share the same pool.
#[derive(Clone)]
pub struct QuestionRepository {
    pool: DbPool,
    prefix: String,
}

impl QuestionRepository {
    /// Creates a repository over `pool` using tables named with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`](crate::SqliteError::InvalidPrefix)
    /// if the prefix is invalid.
    pub fn new(pool: DbPool, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { pool, prefix })
    }

    /// Inserts a question and returns the stored row.
    ///
    /// The store assigns `question_id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`](crate::SqliteError::InvalidInput) for a
    /// blank title or body, and
    /// [`DatabaseError`](crate::SqliteError::DatabaseError) when the
    /// insert fails, for example because the author does not exist.
    pub fn create(&self, title: &str, body: &str, user_id: UserId) -> Result<QuestionRecord> {
        validate_text("title", title)?;
        validate_text("body", body)?;

        let conn = self.conn("create")?;
        let record = conn
            .query_row(
                &format!(
                    "INSERT INTO {p}questions (title, body, user_id) VALUES (?1, ?2, ?3) \
                     RETURNING question_id, title, body, created_at",
                    p = self.prefix
                ),
                params![title, body, user_id.get()],
                convert::question_record,
            )
            .inspect_err(|e| error!(operation = "create", %user_id, error = %e, "insert failed"))?;

        debug!(question_id = %record.question_id, %user_id, "question created");
        Ok(record)
    }

    /// Lists questions, optionally filtered by a search term.
    ///
    /// Without a term (or with an empty one) every question is returned
    /// newest-first with its author's username and answer count. With a
    /// term, only questions whose title or body contains it
    /// (case-sensitive) are returned, oldest-first, with an answer count
    /// but no username.
    pub fn list(&self, search: Option<&str>) -> Result<Vec<QuestionListing>> {
        let conn = self.conn("list")?;
        self.query_listings(&conn, search.filter(|term| !term.is_empty()))
            .inspect_err(|e| error!(operation = "list", error = %e, "query failed"))
    }

    fn query_listings(&self, conn: &Connection, term: Option<&str>) -> Result<Vec<QuestionListing>> {
        let p = &self.prefix;
        let sql = match term {
            None => format!(
                "SELECT q.question_id, q.title, q.body, q.created_at, \
                 (SELECT u.username FROM {p}users u WHERE u.user_id = q.user_id), \
                 (SELECT COUNT(*) FROM {p}answers a WHERE a.question_id = q.question_id) \
                 FROM {p}questions q \
                 ORDER BY q.created_at DESC, q.question_id DESC"
            ),
            // instr() keeps '%' and '_' in the term literal
            Some(_) => format!(
                "SELECT q.question_id, q.title, q.body, q.created_at, NULL, \
                 (SELECT COUNT(*) FROM {p}answers a WHERE a.question_id = q.question_id) \
                 FROM {p}questions q \
                 WHERE instr(q.body, ?1) > 0 OR instr(q.title, ?1) > 0 \
                 ORDER BY q.created_at, q.question_id"
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = match term {
            None => stmt.query_map([], convert::question_listing)?,
            Some(term) => stmt.query_map(params![term], convert::question_listing)?,
        };
        let listings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(listings)
    }

    /// Loads a question with its answers and the answers' comments.
    ///
    /// All three lists are empty when the question does not exist. A
    /// question without answers yields empty `answers` and `comments`.
    pub fn get_detail(&self, question_id: QuestionId) -> Result<QuestionDetail> {
        let conn = self.conn("get_detail")?;
        self.load_detail(&conn, question_id)
            .inspect_err(|e| error!(operation = "get_detail", %question_id, error = %e, "query failed"))
    }

    fn load_detail(&self, conn: &Connection, question_id: QuestionId) -> Result<QuestionDetail> {
        let p = &self.prefix;

        let question: Vec<QuestionListing> = conn
            .prepare(&format!(
                "SELECT q.question_id, q.title, q.body, q.created_at, \
                 (SELECT u.username FROM {p}users u WHERE u.user_id = q.user_id), \
                 (SELECT COUNT(*) FROM {p}answers a WHERE a.question_id = q.question_id) \
                 FROM {p}questions q WHERE q.question_id = ?1"
            ))?
            .query_map(params![question_id.get()], convert::question_listing)?
            .collect::<rusqlite::Result<_>>()?;

        if question.is_empty() {
            debug!(%question_id, "question not found");
            return Ok(QuestionDetail::default());
        }

        let answers: Vec<AnswerView> = conn
            .prepare(&format!(
                "SELECT a.answer_id, a.question_id, a.answer_body, a.created_at, \
                 (SELECT u.username FROM {p}users u WHERE u.user_id = a.user_id), \
                 (SELECT COUNT(*) FROM {p}votes v WHERE v.answer_id = a.answer_id AND v.vote = 1), \
                 (SELECT COUNT(*) FROM {p}votes v WHERE v.answer_id = a.answer_id AND v.vote = 0) \
                 FROM {p}answers a WHERE a.question_id = ?1 \
                 ORDER BY a.created_at, a.answer_id"
            ))?
            .query_map(params![question_id.get()], convert::answer_view)?
            .collect::<rusqlite::Result<_>>()?;

        let comments = self.comments_for_answers(conn, question_id, &answers)?;

        Ok(QuestionDetail {
            question,
            answers,
            comments,
        })
    }

    /// Fetches every comment attached to one of `answers`, all of which
    /// belong to `question_id`.
    ///
    /// No answers means no comments, and no query is issued.
    fn comments_for_answers(
        &self,
        conn: &Connection,
        question_id: QuestionId,
        answers: &[AnswerView],
    ) -> Result<Vec<Comment>> {
        if answers.is_empty() {
            return Ok(Vec::new());
        }

        // One bound parameter however many answers there are
        let p = &self.prefix;
        let mut stmt = conn.prepare(&format!(
            "SELECT comment_id, answer_id, user_id, body, created_at \
             FROM {p}comments \
             WHERE answer_id IN (SELECT answer_id FROM {p}answers WHERE question_id = ?1) \
             ORDER BY created_at, comment_id"
        ))?;
        let comments = stmt
            .query_map(params![question_id.get()], convert::comment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    /// Lists the questions authored by `user_id`, oldest-first.
    pub fn list_by_user(&self, user_id: UserId) -> Result<UserQuestions> {
        let conn = self.conn("list_by_user")?;
        self.query_user_questions(&conn, user_id)
            .map(|question| UserQuestions { question })
            .inspect_err(|e| error!(operation = "list_by_user", %user_id, error = %e, "query failed"))
    }

    fn query_user_questions(&self, conn: &Connection, user_id: UserId) -> Result<Vec<QuestionRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT question_id, title, body, created_at FROM {p}questions \
             WHERE user_id = ?1 ORDER BY created_at, question_id",
            p = self.prefix
        ))?;
        let records = stmt
            .query_map(params![user_id.get()], convert::question_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Returns `true` if `user_id` asked question `question_id`.
    ///
    /// Callers must check this before [`update`](Self::update), which does
    /// not verify authorship itself.
    pub fn is_author(&self, question_id: QuestionId, user_id: UserId) -> Result<bool> {
        let conn = self.conn("is_author")?;
        self.author_matches(&conn, question_id, user_id)
            .inspect_err(|e| error!(operation = "is_author", %question_id, %user_id, error = %e, "query failed"))
    }

    /// Overwrites the title and body of a question.
    ///
    /// Does not check authorship: the caller is responsible for calling
    /// [`is_author`](Self::is_author) first. `created_at` and the author
    /// are never touched. Returns `false` if no question has that id.
    pub fn update(&self, question_id: QuestionId, title: &str, body: &str) -> Result<bool> {
        validate_text("title", title)?;
        validate_text("body", body)?;

        let conn = self.conn("update")?;
        let rows = conn
            .execute(
                &format!(
                    "UPDATE {p}questions SET title = ?1, body = ?2 WHERE question_id = ?3",
                    p = self.prefix
                ),
                params![title, body, question_id.get()],
            )
            .inspect_err(|e| error!(operation = "update", %question_id, error = %e, "update failed"))?;

        debug!(%question_id, rows, "question updated");
        Ok(rows > 0)
    }

    /// Returns `true` if a question with this id and author exists.
    ///
    /// Same predicate as [`is_author`](Self::is_author); used as the
    /// ownership guard of [`delete`](Self::delete).
    pub fn exists(&self, question_id: QuestionId, user_id: UserId) -> Result<bool> {
        let conn = self.conn("exists")?;
        self.author_matches(&conn, question_id, user_id)
            .inspect_err(|e| error!(operation = "exists", %question_id, %user_id, error = %e, "query failed"))
    }

    /// Returns `true` if any question has this id, regardless of author.
    pub fn question_exists(&self, question_id: QuestionId) -> Result<bool> {
        let conn = self.conn("question_exists")?;
        self.find_question(&conn, question_id)
            .inspect_err(|e| error!(operation = "question_exists", %question_id, error = %e, "query failed"))
    }

    /// Deletes a question after checking that it exists and belongs to
    /// `user_id`.
    ///
    /// Answers, votes and comments go with it through the schema's
    /// cascading foreign keys. Store failures are returned as errors,
    /// distinct from the [`DeleteOutcome::NotFound`] and
    /// [`DeleteOutcome::Unauthorized`] guard results.
    pub fn delete(&self, question_id: QuestionId, user_id: UserId) -> Result<DeleteOutcome> {
        let conn = self.conn("delete")?;

        let found = self
            .find_question(&conn, question_id)
            .inspect_err(|e| error!(operation = "delete", %question_id, error = %e, "existence check failed"))?;
        if !found {
            warn!(%question_id, %user_id, "delete rejected: question not found");
            return Ok(DeleteOutcome::NotFound);
        }
        let owned = self
            .author_matches(&conn, question_id, user_id)
            .inspect_err(|e| error!(operation = "delete", %question_id, %user_id, error = %e, "ownership check failed"))?;
        if !owned {
            warn!(%question_id, %user_id, "delete rejected: not the author");
            return Ok(DeleteOutcome::Unauthorized);
        }

        let rows = conn
            .execute(
                &format!(
                    "DELETE FROM {p}questions WHERE question_id = ?1 AND user_id = ?2",
                    p = self.prefix
                ),
                params![question_id.get(), user_id.get()],
            )
            .inspect_err(|e| error!(operation = "delete", %question_id, error = %e, "delete failed"))?;

        // Another caller removed it between the guard and the delete.
        if rows == 0 {
            return Ok(DeleteOutcome::NotFound);
        }
        debug!(%question_id, %user_id, "question deleted");
        Ok(DeleteOutcome::Deleted)
    }

    fn conn(&self, operation: &'static str) -> Result<PooledConnection> {
        checkout(&self.pool)
            .inspect_err(|e| error!(operation, error = %e, "no connection available"))
    }

    fn find_question(&self, conn: &Connection, question_id: QuestionId) -> Result<bool> {
        let found = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {p}questions WHERE question_id = ?1",
                    p = self.prefix
                ),
                params![question_id.get()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn author_matches(
        &self,
        conn: &Connection,
        question_id: QuestionId,
        user_id: UserId,
    ) -> Result<bool> {
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {p}questions WHERE question_id = ?1 AND user_id = ?2",
                p = self.prefix
            ),
            params![question_id.get(), user_id.get()],
            |row| row.get(0),
        )?;
        Ok(count >= 1)
    }
}
