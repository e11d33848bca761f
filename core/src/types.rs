//! Record type definitions for the forum question store.
//!
//! These are the plain-data shapes exchanged with the request-handling
//! layer: identifiers, question rows in their various read shapes, the
//! detail aggregate, and the outcome of a guarded delete. All of them
//! serialize with [`serde`] so a web layer can hand them straight to a
//! JSON encoder.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, parse_identifier};

/// Surrogate key of a row in the questions table.
///
/// # Examples
///
/// ```
/// use forum_core::QuestionId;
///
/// let id: QuestionId = "42".parse().unwrap();
/// assert_eq!(id.get(), 42);
/// assert!("42; DROP TABLE questions".parse::<QuestionId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(i64);

impl QuestionId {
    /// Wraps a raw key, rejecting zero and negative values.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::InvalidIdentifier {
                field: "question_id",
                value: raw.to_string(),
            });
        }
        Ok(Self(raw))
    }

    /// Returns the raw integer key.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for QuestionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_identifier("question_id", s).map(Self)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Surrogate key of a row in the users table.
///
/// # Examples
///
/// ```
/// use forum_core::UserId;
///
/// assert_eq!("7".parse::<UserId>().unwrap().get(), 7);
/// assert!("7 OR 1=1".parse::<UserId>().is_err());
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw key, rejecting zero and negative values.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::InvalidIdentifier {
                field: "user_id",
                value: raw.to_string(),
            });
        }
        Ok(Self(raw))
    }

    /// Returns the raw integer key.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_identifier("user_id", s).map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A freshly inserted question, or a row of a user's question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: QuestionId,
    pub title: String,
    pub body: String,
    /// Assigned by the store on insert; never changed afterwards.
    pub created_at: DateTime<Utc>,
}

/// A question as shown in listings and at the top of the detail view.
///
/// `username` is `None` for rows returned by a search, which skips the
/// author lookup, and for questions whose author row has disappeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionListing {
    pub question_id: QuestionId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Number of answers posted to this question.
    pub answers_count: i64,
}

/// An answer joined with its author's name and vote tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerView {
    pub answer_id: i64,
    pub question_id: QuestionId,
    pub answer_body: String,
    pub created_at: DateTime<Utc>,
    pub username: Option<String>,
    pub up_votes: i64,
    pub down_votes: i64,
}

/// A comment attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: i64,
    pub answer_id: i64,
    pub user_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The detail aggregate: a question, its answers, and their comments.
///
/// `question` holds at most one row; it is empty when the id is unknown.
/// Serializes with the three keys `question`, `answers` and `comments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub question: Vec<QuestionListing>,
    pub answers: Vec<AnswerView>,
    pub comments: Vec<Comment>,
}

impl QuestionDetail {
    /// Returns `true` when no question matched.
    pub fn is_empty(&self) -> bool {
        self.question.is_empty()
    }
}

/// Every question authored by one user, keyed `question` when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuestions {
    pub question: Vec<QuestionRecord>,
}

/// Result of a guarded delete.
///
/// Store failures are reported separately as errors; these three values
/// cover every outcome of a delete that reached the store.
///
/// # Examples
///
/// ```
/// use forum_core::DeleteOutcome;
///
/// assert_eq!(DeleteOutcome::NotFound.status_code(), 404);
/// assert_eq!(DeleteOutcome::Unauthorized.status_code(), 401);
/// assert!(DeleteOutcome::Deleted.is_deleted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The question existed, belonged to the caller, and is gone.
    Deleted,
    /// No question with that id exists.
    NotFound,
    /// The question exists but was asked by someone else.
    Unauthorized,
}

impl DeleteOutcome {
    /// Returns `true` for [`DeleteOutcome::Deleted`].
    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// HTTP status a request handler would typically answer with.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Deleted => 200,
            Self::NotFound => 404,
            Self::Unauthorized => 401,
        }
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deleted => "deleted",
            Self::NotFound => "not found",
            Self::Unauthorized => "unauthorized",
        };
        f.write_str(s)
    }
}
