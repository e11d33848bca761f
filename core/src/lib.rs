//! Core record types and input validation for the forum question store.
//!
//! This crate defines the plain-data vocabulary shared by the storage
//! backend and whatever request-handling layer sits on top of it:
//!
//! - [`QuestionId`] / [`UserId`]: validated surrogate keys.
//! - [`QuestionRecord`], [`QuestionListing`], [`AnswerView`], [`Comment`]:
//!   the row shapes the store returns.
//! - [`QuestionDetail`] / [`UserQuestions`]: read-side aggregates.
//! - [`DeleteOutcome`]: result of a guarded delete.
//! - [`QuestionData`]: loosely-typed request input with validating
//!   accessors.
//! - [`ForumFixture`]: seed data for all five tables.
//!
//! # Example
//!
//! ```
//! use forum_core::*;
//!
//! let data = QuestionData {
//!     title: Some("Lifetimes".into()),
//!     body: Some("What does 'a mean here?".into()),
//!     user_id: Some(RawIdentifier::from("2")),
//!     ..Default::default()
//! };
//! let new = data.new_question().unwrap();
//! assert_eq!(new.user_id, UserId::new(2).unwrap());
//! ```

mod fixture;
mod input;
mod types;
mod validate;

pub use fixture::{
    FixtureAnswer, FixtureComment, FixtureQuestion, FixtureUser, FixtureVote, ForumFixture,
};
pub use input::{NewQuestion, QuestionData, QuestionEdit, RawIdentifier};
pub use types::*;
pub use validate::{ValidationError, validate_fixture, validate_text};
