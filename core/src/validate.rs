//! Input and fixture validation.
//!
//! Everything a caller hands to the store passes through here first:
//! identifiers must be well-formed positive integers, question text must
//! not be blank, and seed fixtures must be internally consistent.
//!
//! # Examples
//!
//! ```
//! use forum_core::*;
//!
//! let mut fixture = ForumFixture::default();
//! fixture.users.push(FixtureUser::new(1, "ada"));
//! fixture.questions.push(FixtureQuestion::new(1, 1, "Title", "Body"));
//! assert!(validate_fixture(&fixture).is_empty());
//!
//! // Question pointing at a missing author
//! fixture.questions.push(FixtureQuestion::new(2, 9, "Orphan", "Body"));
//! assert!(!validate_fixture(&fixture).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::ForumFixture;

/// Input and fixture validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An identifier was not a positive base-10 integer.
    #[error("invalid {field}: '{value}' is not a positive integer")]
    InvalidIdentifier { field: &'static str, value: String },
    /// A required field was absent from the input.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// A text field was empty or whitespace-only.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    /// Two fixture rows of the same table share a key.
    #[error("duplicate {table} id in fixture: {id}")]
    DuplicateFixtureId { table: &'static str, id: i64 },
    /// A fixture row references a parent row that is not in the fixture.
    #[error("{table} row {id} references unknown {parent} {parent_id}")]
    DanglingReference {
        table: &'static str,
        id: i64,
        parent: &'static str,
        parent_id: i64,
    },
}

/// Parses a caller-supplied identifier.
///
/// Accepts optional surrounding whitespace and nothing else: no sign, no
/// trailing text. The value never reaches SQL text, but rejecting junk
/// early keeps error messages close to their cause.
pub(crate) fn parse_identifier(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidIdentifier {
        field,
        value: raw.to_string(),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match trimmed.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid()),
    }
}

/// Checks that a title or body is present and not blank.
pub fn validate_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

/// Validates a seed fixture.
///
/// Reports duplicate keys within each table and rows whose parent
/// (author, question or answer) is not part of the fixture. Returns an
/// empty vector when the fixture is self-contained.
///
/// A [`ValidationError::DanglingReference`] is only fatal if the parent is
/// also missing from the target database; the seeding code checks that.
pub fn validate_fixture(fixture: &ForumFixture) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let users = collect_ids("users", fixture.users.iter().map(|u| u.user_id), &mut errors);
    let questions = collect_ids(
        "questions",
        fixture.questions.iter().map(|q| q.question_id),
        &mut errors,
    );
    let answers = collect_ids(
        "answers",
        fixture.answers.iter().map(|a| a.answer_id),
        &mut errors,
    );
    collect_ids(
        "comments",
        fixture.comments.iter().map(|c| c.comment_id),
        &mut errors,
    );

    for user in &fixture.users {
        if let Err(e) = validate_text("username", &user.username) {
            errors.push(e);
        }
    }

    for q in &fixture.questions {
        check_parent(&mut errors, "questions", q.question_id, "user", q.user_id, &users);
    }
    for a in &fixture.answers {
        check_parent(&mut errors, "answers", a.answer_id, "question", a.question_id, &questions);
        check_parent(&mut errors, "answers", a.answer_id, "user", a.user_id, &users);
    }
    for v in &fixture.votes {
        check_parent(&mut errors, "votes", v.answer_id, "answer", v.answer_id, &answers);
        check_parent(&mut errors, "votes", v.answer_id, "user", v.user_id, &users);
    }
    for c in &fixture.comments {
        check_parent(&mut errors, "comments", c.comment_id, "answer", c.answer_id, &answers);
        check_parent(&mut errors, "comments", c.comment_id, "user", c.user_id, &users);
    }

    errors
}

fn collect_ids(
    table: &'static str,
    ids: impl Iterator<Item = i64>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<i64> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateFixtureId { table, id });
        }
    }
    seen
}

fn check_parent(
    errors: &mut Vec<ValidationError>,
    table: &'static str,
    id: i64,
    parent: &'static str,
    parent_id: i64,
    known: &HashSet<i64>,
) {
    if !known.contains(&parent_id) {
        errors.push(ValidationError::DanglingReference {
            table,
            id,
            parent,
            parent_id,
        });
    }
}
