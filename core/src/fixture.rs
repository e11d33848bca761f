use serde::{Deserialize, Serialize};

/// Serializable seed data for every forum table.
///
/// Rows carry explicit keys so that answers, votes and comments can point
/// at their parents. Used to populate development and test databases; the
/// question store itself never creates users, answers, votes or comments.
///
/// # Examples
///
/// ```
/// use forum_core::*;
///
/// let json = r#"{
///     "users": [{ "user_id": 1, "username": "ada" }],
///     "questions": [{ "question_id": 1, "user_id": 1, "title": "T", "body": "B" }]
/// }"#;
/// let fixture: ForumFixture = serde_json::from_str(json).unwrap();
/// assert_eq!(fixture.row_count(), 2);
/// assert!(fixture.answers.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumFixture {
    #[serde(default)]
    pub users: Vec<FixtureUser>,
    #[serde(default)]
    pub questions: Vec<FixtureQuestion>,
    #[serde(default)]
    pub answers: Vec<FixtureAnswer>,
    #[serde(default)]
    pub votes: Vec<FixtureVote>,
    #[serde(default)]
    pub comments: Vec<FixtureComment>,
}

impl ForumFixture {
    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.users.len()
            + self.questions.len()
            + self.answers.len()
            + self.votes.len()
            + self.comments.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureUser {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Stored as given; hashing belongs to the authentication layer.
    #[serde(default)]
    pub password: Option<String>,
}

impl FixtureUser {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            email: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureQuestion {
    pub question_id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
}

impl FixtureQuestion {
    pub fn new(
        question_id: i64,
        user_id: i64,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            question_id,
            user_id,
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureAnswer {
    pub answer_id: i64,
    pub question_id: i64,
    pub user_id: i64,
    pub answer_body: String,
}

impl FixtureAnswer {
    pub fn new(
        answer_id: i64,
        question_id: i64,
        user_id: i64,
        answer_body: impl Into<String>,
    ) -> Self {
        Self {
            answer_id,
            question_id,
            user_id,
            answer_body: answer_body.into(),
        }
    }
}

/// One up (`true`) or down (`false`) vote on an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureVote {
    pub answer_id: i64,
    pub user_id: i64,
    pub vote: bool,
}

impl FixtureVote {
    pub fn new(answer_id: i64, user_id: i64, vote: bool) -> Self {
        Self {
            answer_id,
            user_id,
            vote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureComment {
    pub comment_id: i64,
    pub answer_id: i64,
    pub user_id: i64,
    pub body: String,
}

impl FixtureComment {
    pub fn new(comment_id: i64, answer_id: i64, user_id: i64, body: impl Into<String>) -> Self {
        Self {
            comment_id,
            answer_id,
            user_id,
            body: body.into(),
        }
    }
}
