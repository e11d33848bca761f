//! Integration tests for the forum-sqlite crate.

use chrono::Utc;
use forum_core::{
    DeleteOutcome, FixtureAnswer, FixtureComment, FixtureQuestion, FixtureUser, FixtureVote,
    ForumFixture, QuestionData, QuestionId, RawIdentifier, UserId,
};
use forum_db::DatabaseConfig;
use forum_sqlite::{ErrorKind, Migration, QuestionRepository, SqliteError, create_pool};

const PREFIX: &str = "forum_";

/// Users 1 (ada), 2 (bob) and 3 (cy); no questions.
fn users_fixture() -> ForumFixture {
    let mut fixture = ForumFixture::default();
    fixture.users.push(FixtureUser::new(1, "ada"));
    fixture.users.push(FixtureUser::new(2, "bob"));
    fixture.users.push(FixtureUser::new(3, "cy"));
    fixture
}

/// A question thread with answers, votes and comments, plus a second
/// question whose comments must not leak into the first one's detail.
fn thread_fixture() -> ForumFixture {
    let mut fixture = users_fixture();
    fixture
        .questions
        .push(FixtureQuestion::new(1, 1, "Borrow checker", "Why does this move?"));
    fixture
        .questions
        .push(FixtureQuestion::new(2, 2, "Lifetimes", "What is 'a?"));

    fixture
        .answers
        .push(FixtureAnswer::new(10, 1, 2, "Use a reference"));
    fixture.answers.push(FixtureAnswer::new(11, 1, 3, "Clone it"));
    fixture
        .answers
        .push(FixtureAnswer::new(20, 2, 1, "A named lifetime"));

    fixture.votes.push(FixtureVote::new(10, 1, true));
    fixture.votes.push(FixtureVote::new(10, 3, true));
    fixture.votes.push(FixtureVote::new(11, 1, false));
    fixture.votes.push(FixtureVote::new(11, 2, true));

    fixture
        .comments
        .push(FixtureComment::new(100, 10, 1, "Thanks!"));
    fixture
        .comments
        .push(FixtureComment::new(101, 11, 2, "Cloning is costly"));
    fixture
        .comments
        .push(FixtureComment::new(200, 20, 3, "Other thread"));
    fixture
}

struct TestStore {
    _dir: tempfile::TempDir,
    migration: Migration,
    repo: QuestionRepository,
}

/// Helper to create the tables in a fresh database file and seed it.
fn setup(fixture: &ForumFixture) -> TestStore {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::new(dir.path().join("forum.db"))
        .with_prefix(PREFIX)
        .with_pool_size(4);
    let pool = create_pool(&config).unwrap();

    let migration = Migration::new(pool.clone(), PREFIX).unwrap();
    migration.up().unwrap();
    migration.seed_fixture(fixture).unwrap();

    let repo = QuestionRepository::new(pool, PREFIX).unwrap();
    TestStore {
        _dir: dir,
        migration,
        repo,
    }
}

fn user(id: i64) -> UserId {
    UserId::new(id).unwrap()
}

fn qid(id: i64) -> QuestionId {
    QuestionId::new(id).unwrap()
}

// =============================================================================
// Create / detail
// =============================================================================

#[test]
fn test_create_then_get_detail() {
    let store = setup(&users_fixture());

    let created = store.repo.create("T", "B", user(1)).unwrap();
    assert_eq!(created.title, "T");
    assert_eq!(created.body, "B");
    assert!((Utc::now() - created.created_at).num_seconds().abs() < 60);

    let detail = store.repo.get_detail(created.question_id).unwrap();
    assert_eq!(detail.question.len(), 1);
    let question = &detail.question[0];
    assert_eq!(question.question_id, created.question_id);
    assert_eq!(question.title, "T");
    assert_eq!(question.body, "B");
    assert_eq!(question.username.as_deref(), Some("ada"));
    assert_eq!(question.answers_count, 0);
    assert_eq!(question.created_at, created.created_at);
}

#[test]
fn test_detail_without_answers_has_empty_children() {
    let store = setup(&users_fixture());
    let created = store.repo.create("Lonely", "No answers yet", user(2)).unwrap();

    let detail = store.repo.get_detail(created.question_id).unwrap();
    assert_eq!(detail.question.len(), 1);
    assert!(detail.answers.is_empty());
    assert!(detail.comments.is_empty());
}

#[test]
fn test_detail_of_unknown_question_is_empty() {
    let store = setup(&users_fixture());
    let detail = store.repo.get_detail(qid(999)).unwrap();
    assert!(detail.is_empty());
    assert!(detail.answers.is_empty());
    assert!(detail.comments.is_empty());
}

#[test]
fn test_detail_aggregates_answers_votes_and_comments() {
    let store = setup(&thread_fixture());

    let detail = store.repo.get_detail(qid(1)).unwrap();
    assert_eq!(detail.question[0].answers_count, 2);
    assert_eq!(detail.question[0].username.as_deref(), Some("ada"));

    assert_eq!(detail.answers.len(), 2);
    let first = detail.answers.iter().find(|a| a.answer_id == 10).unwrap();
    assert_eq!(first.username.as_deref(), Some("bob"));
    assert_eq!(first.up_votes, 2);
    assert_eq!(first.down_votes, 0);

    let second = detail.answers.iter().find(|a| a.answer_id == 11).unwrap();
    assert_eq!(second.username.as_deref(), Some("cy"));
    assert_eq!(second.up_votes, 1);
    assert_eq!(second.down_votes, 1);

    let mut comment_ids: Vec<i64> = detail.comments.iter().map(|c| c.comment_id).collect();
    comment_ids.sort_unstable();
    assert_eq!(comment_ids, vec![100, 101]);
    assert!(detail.comments.iter().all(|c| c.answer_id == 10 || c.answer_id == 11));
}

#[test]
fn test_create_rejects_blank_text() {
    let store = setup(&users_fixture());
    let err = store.repo.create("  ", "body", user(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(store.repo.list(None).unwrap().is_empty());
}

#[test]
fn test_create_with_unknown_author_is_a_database_error() {
    let store = setup(&users_fixture());
    let err = store.repo.create("T", "B", user(77)).unwrap_err();
    assert!(matches!(err, SqliteError::DatabaseError(_)));
    assert_eq!(err.kind(), ErrorKind::Database);
    assert!(!err.is_transient());
}

// =============================================================================
// Listing and search
// =============================================================================

#[test]
fn test_list_is_newest_first_with_usernames() {
    let store = setup(&users_fixture());
    let a = store.repo.create("First", "one", user(1)).unwrap();
    let b = store.repo.create("Second", "two", user(2)).unwrap();
    let c = store.repo.create("Third", "three", user(3)).unwrap();

    let listings = store.repo.list(None).unwrap();
    let ids: Vec<QuestionId> = listings.iter().map(|l| l.question_id).collect();
    assert_eq!(ids, vec![c.question_id, b.question_id, a.question_id]);

    assert!(
        listings
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
    assert_eq!(listings[0].username.as_deref(), Some("cy"));
    assert_eq!(listings[2].username.as_deref(), Some("ada"));
}

#[test]
fn test_empty_search_term_lists_everything() {
    let store = setup(&thread_fixture());
    let all = store.repo.list(None).unwrap();
    let empty = store.repo.list(Some("")).unwrap();
    assert_eq!(all, empty);
    assert_eq!(all.len(), 2);
}

#[test]
fn test_search_is_case_sensitive_substring_oldest_first() {
    let store = setup(&users_fixture());
    let in_title = store.repo.create("Tokio runtime", "How to start it", user(1)).unwrap();
    store.repo.create("tokio lowercase", "nothing here", user(2)).unwrap();
    let in_body = store.repo.create("Async", "Is Tokio required?", user(3)).unwrap();
    store.repo.create("Unrelated", "Serde", user(1)).unwrap();

    let found = store.repo.list(Some("Tokio")).unwrap();
    let ids: Vec<QuestionId> = found.iter().map(|l| l.question_id).collect();
    assert_eq!(ids, vec![in_title.question_id, in_body.question_id]);

    // Search results skip the author lookup
    assert!(found.iter().all(|l| l.username.is_none()));
    assert!(found.iter().all(|l| l.answers_count == 0));
}

#[test]
fn test_search_reports_answer_counts() {
    let store = setup(&thread_fixture());
    let found = store.repo.list(Some("Borrow")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].answers_count, 2);
}

#[test]
fn test_search_treats_wildcards_and_quotes_literally() {
    let store = setup(&users_fixture());
    store.repo.create("Percent", "100 percent sure", user(1)).unwrap();
    let literal = store.repo.create("Discount", "Save 50% today", user(1)).unwrap();

    let found = store.repo.list(Some("%")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].question_id, literal.question_id);

    let payload = "'; DROP TABLE forum_questions; --";
    assert!(store.repo.list(Some(payload)).unwrap().is_empty());
    assert_eq!(store.repo.list(None).unwrap().len(), 2);
}

#[test]
fn test_list_by_user_only_returns_that_author_oldest_first() {
    let store = setup(&users_fixture());
    let first = store.repo.create("Mine 1", "a", user(2)).unwrap();
    store.repo.create("Theirs", "b", user(1)).unwrap();
    let second = store.repo.create("Mine 2", "c", user(2)).unwrap();

    let mine = store.repo.list_by_user(user(2)).unwrap();
    let ids: Vec<QuestionId> = mine.question.iter().map(|q| q.question_id).collect();
    assert_eq!(ids, vec![first.question_id, second.question_id]);

    assert!(store.repo.list_by_user(user(3)).unwrap().question.is_empty());
}

#[test]
fn test_list_by_user_from_request_data() {
    let store = setup(&users_fixture());
    store.repo.create("Mine", "a", user(1)).unwrap();

    let data = QuestionData {
        user_id: Some(RawIdentifier::from("1")),
        ..Default::default()
    };
    let mine = store.repo.list_by_user(data.user_id().unwrap()).unwrap();
    assert_eq!(mine.question.len(), 1);

    let hostile = QuestionData {
        user_id: Some(RawIdentifier::from("1 OR 1=1")),
        ..Default::default()
    };
    let err: SqliteError = hostile.user_id().unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// =============================================================================
// Authorship, update, delete
// =============================================================================

#[test]
fn test_is_author_matches_only_the_creator() {
    let store = setup(&users_fixture());
    let created = store.repo.create("T", "B", user(1)).unwrap();

    assert!(store.repo.is_author(created.question_id, user(1)).unwrap());
    assert!(!store.repo.is_author(created.question_id, user(2)).unwrap());
    assert!(store.repo.exists(created.question_id, user(1)).unwrap());
    assert!(!store.repo.exists(created.question_id, user(3)).unwrap());
    assert!(!store.repo.is_author(qid(999), user(1)).unwrap());
}

#[test]
fn test_update_overwrites_text_only() {
    let store = setup(&users_fixture());
    let created = store.repo.create("Old title", "Old body", user(1)).unwrap();

    assert!(store.repo.is_author(created.question_id, user(1)).unwrap());
    assert!(
        store
            .repo
            .update(created.question_id, "New title", "New body")
            .unwrap()
    );

    let detail = store.repo.get_detail(created.question_id).unwrap();
    let question = &detail.question[0];
    assert_eq!(question.title, "New title");
    assert_eq!(question.body, "New body");
    assert_eq!(question.created_at, created.created_at);
    assert_eq!(question.username.as_deref(), Some("ada"));
    assert!(store.repo.is_author(created.question_id, user(1)).unwrap());
}

#[test]
fn test_update_unknown_question_reports_no_match() {
    let store = setup(&users_fixture());
    assert!(!store.repo.update(qid(42), "T", "B").unwrap());
}

#[test]
fn test_update_rejects_blank_body() {
    let store = setup(&users_fixture());
    let created = store.repo.create("T", "B", user(1)).unwrap();
    let err = store.repo.update(created.question_id, "T", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(
        store.repo.get_detail(created.question_id).unwrap().question[0].body,
        "B"
    );
}

#[test]
fn test_delete_by_wrong_user_is_unauthorized() {
    let store = setup(&users_fixture());
    let created = store.repo.create("T", "B", user(1)).unwrap();

    let outcome = store.repo.delete(created.question_id, user(2)).unwrap();
    assert_eq!(outcome, DeleteOutcome::Unauthorized);
    assert!(store.repo.question_exists(created.question_id).unwrap());
    assert_eq!(store.repo.get_detail(created.question_id).unwrap().question.len(), 1);
}

#[test]
fn test_delete_missing_question_is_not_found() {
    let store = setup(&users_fixture());
    let outcome = store.repo.delete(qid(12345), user(1)).unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFound);
}

#[test]
fn test_delete_by_author_removes_question() {
    let store = setup(&users_fixture());
    let created = store.repo.create("T", "B", user(1)).unwrap();

    let outcome = store.repo.delete(created.question_id, user(1)).unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(store.repo.get_detail(created.question_id).unwrap().question.is_empty());

    // A second delete finds nothing
    assert_eq!(
        store.repo.delete(created.question_id, user(1)).unwrap(),
        DeleteOutcome::NotFound
    );
}

#[test]
fn test_delete_cascades_to_answers_votes_and_comments() {
    let store = setup(&thread_fixture());
    let before = store.migration.status().unwrap();
    assert_eq!(before.answer_count, 3);
    assert_eq!(before.vote_count, 4);
    assert_eq!(before.comment_count, 3);

    assert_eq!(
        store.repo.delete(qid(1), user(1)).unwrap(),
        DeleteOutcome::Deleted
    );

    let after = store.migration.status().unwrap();
    assert_eq!(after.question_count, 1);
    assert_eq!(after.answer_count, 1);
    assert_eq!(after.vote_count, 0);
    assert_eq!(after.comment_count, 1);

    // The other thread is untouched
    let other = store.repo.get_detail(qid(2)).unwrap();
    assert_eq!(other.answers.len(), 1);
    assert_eq!(other.comments.len(), 1);
}

// =============================================================================
// Store failures and concurrency
// =============================================================================

#[test]
fn test_missing_tables_surface_as_errors_not_empty_results() {
    let store = setup(&users_fixture());
    store.migration.down().unwrap();

    assert!(store.repo.list(None).is_err());
    assert!(store.repo.get_detail(qid(1)).is_err());
    assert!(store.repo.list_by_user(user(1)).is_err());
    let err = store.repo.delete(qid(1), user(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Database);
}

#[test]
fn test_corrupt_stored_timestamp_is_a_conversion_error() {
    let store = setup(&users_fixture());
    let created = store.repo.create("T", "B", user(1)).unwrap();

    let conn = store.migration.pool().get().unwrap();
    conn.execute(
        "UPDATE forum_questions SET created_at = 'garbage' WHERE question_id = ?1",
        [created.question_id.get()],
    )
    .unwrap();
    drop(conn);

    let err = store.repo.get_detail(created.question_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(store.repo.list(None).unwrap_err().kind(), ErrorKind::Conversion);
}

#[test]
fn test_repository_shared_across_threads() {
    let store = setup(&users_fixture());

    let handles: Vec<_> = (1..=3)
        .map(|author| {
            let repo = store.repo.clone();
            std::thread::spawn(move || {
                for n in 0..5 {
                    repo.create(&format!("Q{author}-{n}"), "body", user(author))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.repo.list(None).unwrap().len(), 15);
    assert_eq!(store.repo.list_by_user(user(2)).unwrap().question.len(), 5);
}

// =============================================================================
// Migration lifecycle
// =============================================================================

#[test]
fn test_seed_from_json_file_and_refresh() {
    let store = setup(&ForumFixture::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forum.json");
    std::fs::write(&path, serde_json::to_string_pretty(&thread_fixture()).unwrap()).unwrap();

    let report = store.migration.seed(&path).unwrap();
    assert_eq!(report.users_inserted, 3);
    assert_eq!(report.questions_inserted, 2);
    assert_eq!(report.answers_inserted, 3);
    assert_eq!(report.votes_inserted, 4);
    assert_eq!(report.comments_inserted, 3);

    // Rows created through the repository disappear on refresh
    store.repo.create("Extra", "row", user(1)).unwrap();
    assert_eq!(store.migration.status().unwrap().question_count, 3);

    let report = store.migration.refresh(&path).unwrap();
    assert_eq!(report.total(), 15);
    assert_eq!(store.migration.status().unwrap().question_count, 2);
}

#[test]
fn test_seed_reports_unreadable_fixture() {
    let store = setup(&ForumFixture::default());
    let err = store.migration.seed("/nonexistent/forum.json").unwrap_err();
    assert!(matches!(err, SqliteError::FixtureError(_)));
    assert_eq!(err.kind(), ErrorKind::Migration);
}

#[test]
fn test_prefixes_isolate_forums() {
    let store = setup(&users_fixture());
    let other = Migration::new(store.migration.pool().clone(), "other_").unwrap();
    other.up().unwrap();
    other.seed_fixture(&users_fixture()).unwrap();

    let other_repo = QuestionRepository::new(other.pool().clone(), "other_").unwrap();
    other_repo.create("Elsewhere", "b", user(1)).unwrap();

    assert!(store.repo.list(None).unwrap().is_empty());
    assert_eq!(other_repo.list(None).unwrap().len(), 1);
}
