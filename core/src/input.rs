//! Request data handed over by the web layer.
//!
//! [`QuestionData`] mirrors the loosely-typed dictionary a request handler
//! collects from the path, query string and JSON body. Every field is
//! optional; the typed accessors turn it into validated values right
//! before a repository call needs them.

use serde::{Deserialize, Serialize};

use crate::types::{QuestionId, UserId};
use crate::validate::{ValidationError, validate_text};

/// An identifier as it arrives from a request: a JSON number, or text
/// taken from a path segment or query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawIdentifier {
    Number(i64),
    Text(String),
}

impl From<i64> for RawIdentifier {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RawIdentifier {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Loosely-typed question input.
///
/// # Examples
///
/// ```
/// use forum_core::QuestionData;
///
/// let data: QuestionData = serde_json::from_str(
///     r#"{"title": "Borrowing", "body": "Why does this move?", "user_id": "3"}"#,
/// ).unwrap();
/// let new = data.new_question().unwrap();
/// assert_eq!(new.user_id.get(), 3);
///
/// let bad: QuestionData = serde_json::from_str(r#"{"user_id": "3 OR 1=1"}"#).unwrap();
/// assert!(bad.user_id().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Free-text search term.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub question_id: Option<RawIdentifier>,
    #[serde(default)]
    pub user_id: Option<RawIdentifier>,
}

/// Validated input for inserting a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub body: String,
    pub user_id: UserId,
}

/// Validated input for overwriting a question's title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionEdit {
    pub question_id: QuestionId,
    pub title: String,
    pub body: String,
}

impl QuestionData {
    /// Returns the validated question id.
    pub fn question_id(&self) -> Result<QuestionId, ValidationError> {
        match &self.question_id {
            None => Err(ValidationError::MissingField("question_id")),
            Some(RawIdentifier::Number(n)) => QuestionId::new(*n),
            Some(RawIdentifier::Text(s)) => s.parse(),
        }
    }

    /// Returns the validated user id.
    pub fn user_id(&self) -> Result<UserId, ValidationError> {
        match &self.user_id {
            None => Err(ValidationError::MissingField("user_id")),
            Some(RawIdentifier::Number(n)) => UserId::new(*n),
            Some(RawIdentifier::Text(s)) => s.parse(),
        }
    }

    /// Returns the search term, treating an empty string as absent.
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }

    /// Builds the input for a create call.
    pub fn new_question(&self) -> Result<NewQuestion, ValidationError> {
        let (title, body) = self.text_fields()?;
        Ok(NewQuestion {
            title,
            body,
            user_id: self.user_id()?,
        })
    }

    /// Builds the input for an update call.
    pub fn edit(&self) -> Result<QuestionEdit, ValidationError> {
        let (title, body) = self.text_fields()?;
        Ok(QuestionEdit {
            question_id: self.question_id()?,
            title,
            body,
        })
    }

    fn text_fields(&self) -> Result<(String, String), ValidationError> {
        let title = self
            .title
            .as_deref()
            .ok_or(ValidationError::MissingField("title"))?;
        let body = self
            .body
            .as_deref()
            .ok_or(ValidationError::MissingField("body"))?;
        validate_text("title", title)?;
        validate_text("body", body)?;
        Ok((title.to_string(), body.to_string()))
    }
}
