use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use forum_core::{DeleteOutcome, QuestionData, QuestionId, RawIdentifier};
use forum_db::DatabaseConfig;
use forum_sqlite::{Migration, QuestionRepository, create_pool};
use serde::Serialize;
use tracing::info;

/// Database file used when neither a config file, `--db`, nor
/// `FORUM_DATABASE` names one.
const DEFAULT_DATABASE: &str = "forum.db";

#[derive(Debug, Parser)]
#[command(name = "forum")]
#[command(version, about = "Forum question store administration")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct DatabaseArgs {
    /// YAML configuration file; FORUM_* environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file path. Overrides the config file and environment.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Table prefix. Overrides the config file and environment.
    #[arg(long, global = true)]
    prefix: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Schema migration and seeding operations.
    Migrate(MigrateArgs),
    /// Ask, browse, edit and delete questions.
    Question(QuestionArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(subcommand)]
    operation: MigrateOperation,
}

#[derive(Debug, Subcommand)]
enum MigrateOperation {
    /// Create the forum tables.
    Up,
    /// Drop the forum tables.
    Down,
    /// Show whether the tables exist and their row counts.
    Status,
    /// Load users, questions, answers, votes and comments from a JSON fixture.
    Seed(FixtureArgs),
    /// Drop tables, recreate, and reseed from a JSON fixture.
    Refresh(FixtureArgs),
}

#[derive(Debug, Args)]
struct FixtureArgs {
    /// JSON fixture file.
    #[arg(long)]
    fixture: PathBuf,
}

#[derive(Debug, Args)]
struct QuestionArgs {
    #[command(subcommand)]
    operation: QuestionOperation,
}

#[derive(Debug, Subcommand)]
enum QuestionOperation {
    /// Ask a new question.
    Ask(AskArgs),
    /// List questions, newest first, or search them.
    List(ListArgs),
    /// Show a question with its answers and comments.
    Show(ShowArgs),
    /// List the questions a user asked.
    Mine(MineArgs),
    /// Edit a question's title and body. Only its author may do this.
    Edit(EditArgs),
    /// Delete a question. Only its author may do this.
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct AskArgs {
    /// Author's user id.
    #[arg(long)]
    user: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    body: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Case-sensitive substring to look for in titles and bodies.
    #[arg(long)]
    q: Option<String>,
}

#[derive(Debug, Args)]
struct ShowArgs {
    question: String,
}

#[derive(Debug, Args)]
struct MineArgs {
    #[arg(long)]
    user: String,
}

#[derive(Debug, Args)]
struct EditArgs {
    question: String,
    /// User requesting the edit.
    #[arg(long)]
    user: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    body: String,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    question: String,
    /// User requesting the delete.
    #[arg(long)]
    user: String,
}

#[derive(Debug, Serialize)]
struct DeleteReport {
    question_id: QuestionId,
    outcome: DeleteOutcome,
    status: u16,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Command::Migrate(args) => run_migrate(&cli.database, args),
        Command::Question(args) => run_question(&cli.database, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Builds the database configuration: config file (or defaults), then the
/// environment, then command-line flags.
fn resolve_config(args: &DatabaseArgs) -> Result<DatabaseConfig, String> {
    let base = match &args.config {
        Some(path) => DatabaseConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => DatabaseConfig::new(DEFAULT_DATABASE),
    };
    let mut config = base
        .apply_env()
        .map_err(|e| format!("Invalid environment override: {e}"))?;

    if let Some(db) = &args.db {
        config.database = db.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;

    info!(
        database = %config.database.display(),
        prefix = %config.prefix,
        "using database"
    );
    Ok(config)
}

fn open_migration(config: &DatabaseConfig) -> Result<Migration, String> {
    let pool = create_pool(config).map_err(|e| {
        format!(
            "Failed to open database '{}': {e}",
            config.database.display()
        )
    })?;
    Migration::new(pool, &config.prefix)
        .map_err(|e| format!("Failed to initialize migration: {e}"))
}

fn open_repository(config: &DatabaseConfig) -> Result<QuestionRepository, String> {
    let pool = create_pool(config).map_err(|e| {
        format!(
            "Failed to open database '{}': {e}",
            config.database.display()
        )
    })?;
    QuestionRepository::new(pool, &config.prefix)
        .map_err(|e| format!("Failed to initialize repository: {e}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{text}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

fn run_migrate(database: &DatabaseArgs, args: MigrateArgs) -> Result<(), String> {
    let config = resolve_config(database)?;
    let migration = open_migration(&config)?;

    match args.operation {
        MigrateOperation::Up => {
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            print_json(&serde_json::json!({
                "operation": "up",
                "database": config.database.display().to_string(),
                "prefix": config.prefix,
            }))
        }
        MigrateOperation::Down => {
            migration
                .down()
                .map_err(|e| format!("Migration down failed: {e}"))?;
            print_json(&serde_json::json!({
                "operation": "down",
                "database": config.database.display().to_string(),
                "prefix": config.prefix,
            }))
        }
        MigrateOperation::Status => {
            let status = migration
                .status()
                .map_err(|e| format!("Failed to get migration status: {e}"))?;
            print_json(&status)
        }
        MigrateOperation::Seed(fixture) => {
            let report = migration
                .seed(&fixture.fixture)
                .map_err(|e| format!("Seed failed: {e}"))?;
            print_json(&report)
        }
        MigrateOperation::Refresh(fixture) => {
            let report = migration
                .refresh(&fixture.fixture)
                .map_err(|e| format!("Refresh failed: {e}"))?;
            print_json(&report)
        }
    }
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

fn run_question(database: &DatabaseArgs, args: QuestionArgs) -> Result<(), String> {
    let config = resolve_config(database)?;
    let repo = open_repository(&config)?;

    match args.operation {
        QuestionOperation::Ask(a) => run_ask(&repo, a),
        QuestionOperation::List(a) => run_list(&repo, a),
        QuestionOperation::Show(a) => run_show(&repo, a),
        QuestionOperation::Mine(a) => run_mine(&repo, a),
        QuestionOperation::Edit(a) => run_edit(&repo, a),
        QuestionOperation::Delete(a) => run_delete(&repo, a),
    }
}

// Ids and text arrive as raw strings and are validated through
// `QuestionData`, the same way a request handler would.

impl AskArgs {
    fn data(self) -> QuestionData {
        QuestionData {
            title: Some(self.title),
            body: Some(self.body),
            user_id: Some(RawIdentifier::Text(self.user)),
            ..Default::default()
        }
    }
}

impl ListArgs {
    fn data(self) -> QuestionData {
        QuestionData {
            q: self.q,
            ..Default::default()
        }
    }
}

impl ShowArgs {
    fn data(self) -> QuestionData {
        QuestionData {
            question_id: Some(RawIdentifier::Text(self.question)),
            ..Default::default()
        }
    }
}

impl MineArgs {
    fn data(self) -> QuestionData {
        QuestionData {
            user_id: Some(RawIdentifier::Text(self.user)),
            ..Default::default()
        }
    }
}

impl EditArgs {
    fn data(self) -> QuestionData {
        QuestionData {
            title: Some(self.title),
            body: Some(self.body),
            question_id: Some(RawIdentifier::Text(self.question)),
            user_id: Some(RawIdentifier::Text(self.user)),
            ..Default::default()
        }
    }
}

impl DeleteArgs {
    fn data(self) -> QuestionData {
        QuestionData {
            question_id: Some(RawIdentifier::Text(self.question)),
            user_id: Some(RawIdentifier::Text(self.user)),
            ..Default::default()
        }
    }
}

fn invalid(e: forum_core::ValidationError) -> String {
    format!("Invalid input: {e}")
}

fn run_ask(repo: &QuestionRepository, args: AskArgs) -> Result<(), String> {
    let new = args.data().new_question().map_err(invalid)?;
    let record = repo
        .create(&new.title, &new.body, new.user_id)
        .map_err(|e| format!("Failed to create question: {e}"))?;
    print_json(&record)
}

fn run_list(repo: &QuestionRepository, args: ListArgs) -> Result<(), String> {
    let data = args.data();
    let listings = repo
        .list(data.search_term())
        .map_err(|e| format!("Failed to list questions: {e}"))?;
    print_json(&listings)
}

fn run_show(repo: &QuestionRepository, args: ShowArgs) -> Result<(), String> {
    let question_id = args.data().question_id().map_err(invalid)?;
    let detail = repo
        .get_detail(question_id)
        .map_err(|e| format!("Failed to load question {question_id}: {e}"))?;
    print_json(&detail)
}

fn run_mine(repo: &QuestionRepository, args: MineArgs) -> Result<(), String> {
    let user_id = args.data().user_id().map_err(invalid)?;
    let questions = repo
        .list_by_user(user_id)
        .map_err(|e| format!("Failed to list questions of user {user_id}: {e}"))?;
    print_json(&questions)
}

fn run_edit(repo: &QuestionRepository, args: EditArgs) -> Result<(), String> {
    let data = args.data();
    let edit = data.edit().map_err(invalid)?;
    let user_id = data.user_id().map_err(invalid)?;
    let question_id = edit.question_id;

    // update() trusts its caller, so authorship is checked here
    let is_author = repo
        .is_author(question_id, user_id)
        .map_err(|e| format!("Failed to check authorship: {e}"))?;
    if !is_author {
        let exists = repo
            .question_exists(question_id)
            .map_err(|e| format!("Failed to look up question {question_id}: {e}"))?;
        return Err(if exists {
            format!("user {user_id} is not the author of question {question_id}")
        } else {
            format!("question {question_id} not found")
        });
    }

    let updated = repo
        .update(question_id, &edit.title, &edit.body)
        .map_err(|e| format!("Failed to update question {question_id}: {e}"))?;
    if !updated {
        return Err(format!("question {question_id} not found"));
    }

    let detail = repo
        .get_detail(question_id)
        .map_err(|e| format!("Failed to load question {question_id}: {e}"))?;
    print_json(&detail.question)
}

fn run_delete(repo: &QuestionRepository, args: DeleteArgs) -> Result<(), String> {
    let data = args.data();
    let question_id = data.question_id().map_err(invalid)?;
    let user_id = data.user_id().map_err(invalid)?;

    let outcome = repo
        .delete(question_id, user_id)
        .map_err(|e| format!("Failed to delete question {question_id}: {e}"))?;
    print_json(&DeleteReport {
        question_id,
        outcome,
        status: outcome.status_code(),
    })?;

    if outcome.is_deleted() {
        Ok(())
    } else {
        Err(format!("question {question_id} was not deleted: {outcome}"))
    }
}
