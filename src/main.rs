use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use qcm_forge::config::Config;
use qcm_forge::db::{self, models::QuestionFilter, progress, queries, schema};
use qcm_forge::keywords::embeddings::OllamaEmbedder;
use qcm_forge::keywords::KeywordExtractor;
use qcm_forge::notes;
use qcm_forge::output::terminal;
use qcm_forge::qcm::llm::OllamaChat;
use qcm_forge::qcm::prompt::Prompts;
use qcm_forge::qcm::QcmGenerator;

/// qcm-forge: multiple-choice questions from French study notes.
///
/// Extracts keywords from Markdown notes, asks a local Ollama model for
/// questions, and keeps them in a SQLite question bank you can quiz from.
#[derive(Parser)]
#[command(name = "qcm-forge", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the question database
    Init,

    /// Generate questions from every Markdown note in a folder
    Generate {
        /// Notes folder (defaults to QCM_NOTES_DIR)
        dir: Option<PathBuf>,
    },

    /// Show the keywords extracted from a single note
    KeywordsOf {
        file: PathBuf,

        /// Number of keywords to extract
        #[arg(short = 'n', long, default_value = "5")]
        num: usize,
    },

    /// List the subjects in the question bank
    Subjects,

    /// List the keywords in the question bank
    Keywords,

    /// Show a random question
    Random {
        #[arg(long)]
        subject: Option<String>,

        /// Only questions carrying one of these keywords (repeatable)
        #[arg(long = "keyword")]
        keywords: Vec<String>,

        /// Highlight the correct answer
        #[arg(long)]
        reveal: bool,
    },

    /// List questions, newest first
    List {
        #[arg(long)]
        subject: Option<String>,

        #[arg(long = "keyword")]
        keywords: Vec<String>,

        #[arg(long, default_value = "20")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Take an interactive quiz and record the result
    Quiz {
        #[arg(long, default_value = "default")]
        user: String,

        #[arg(long)]
        subject: Option<String>,

        /// Number of questions
        #[arg(short = 'n', long, default_value = "5")]
        count: u32,
    },

    /// Show question bank statistics
    Stats,

    /// Search questions by text, subject or keyword
    Search { query: String },

    /// Record a quiz taken elsewhere, e.g. `record --subject Réseaux 12=A 15=C`
    Record {
        #[arg(long, default_value = "default")]
        user: String,

        #[arg(long)]
        subject: String,

        /// Answers as QUESTION_ID=CHOICE
        #[arg(required = true)]
        answers: Vec<String>,
    },

    /// Show a user's quiz history
    Progress {
        #[arg(long, default_value = "default")]
        user: String,
    },

    /// Suggest questions to practice next
    Recommend {
        #[arg(long)]
        subject: Option<String>,

        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("qcm_forge=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing question database...");
            let conn = db::initialize(&config.db_path)?;
            let table_count = schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: make sure Ollama is running with these models:");
            println!("  chat:       {}", config.chat_model);
            println!("  embeddings: {}", config.embedding_model);
            println!("\nThen run: qcm-forge generate <NOTES_DIR>");
        }

        Commands::Generate { dir } => {
            let dir = config.require_notes_dir(dir.as_deref())?;
            let conn = db::initialize(&config.db_path)?;

            let mut generator = build_generator(&config)?.with_progress(true);
            println!("Generating questions from {}...", dir.display());
            let summary = generator.process_folder(&dir, &conn).await?;
            terminal::display_summary(&summary);
        }

        Commands::KeywordsOf { file, num } => {
            let content = notes::read_note(&file)?;
            let mut extractor = build_extractor(&config);
            let keywords = extractor.extract_keywords(&content, num).await?;

            if keywords.is_empty() {
                println!("No keywords found in {}", file.display());
            } else {
                println!("\n{}", format!("Keywords for {}", file.display()).bold());
                for (i, keyword) in keywords.iter().enumerate() {
                    println!("  {}. {}", i + 1, keyword);
                }
            }
        }

        Commands::Subjects => {
            let conn = db::open(&config.db_path)?;
            terminal::display_list("Subjects", &queries::get_subjects(&conn)?);
        }

        Commands::Keywords => {
            let conn = db::open(&config.db_path)?;
            terminal::display_list("Keywords", &queries::get_keywords(&conn)?);
        }

        Commands::Random {
            subject,
            keywords,
            reveal,
        } => {
            let conn = db::open(&config.db_path)?;
            let filter = QuestionFilter { subject, keywords };
            match queries::load_random_question(&conn, &filter)? {
                Some(question) => terminal::display_question(&question, reveal),
                None => println!("No question matches those filters."),
            }
        }

        Commands::List {
            subject,
            keywords,
            limit,
            offset,
        } => {
            let conn = db::open(&config.db_path)?;
            let filter = QuestionFilter { subject, keywords };
            let questions = queries::load_questions(&conn, &filter, limit, offset, false)?;
            terminal::display_question_list(&questions);
        }

        Commands::Quiz {
            user,
            subject,
            count,
        } => {
            let conn = db::open(&config.db_path)?;
            run_quiz(&conn, &user, subject, count)?;
        }

        Commands::Stats => {
            let conn = db::open(&config.db_path)?;
            terminal::display_stats(&queries::get_stats(&conn)?);
        }

        Commands::Search { query } => {
            let conn = db::open(&config.db_path)?;
            terminal::display_question_list(&queries::search_questions(&conn, &query)?);
        }

        Commands::Record {
            user,
            subject,
            answers,
        } => {
            let conn = db::open(&config.db_path)?;

            let mut question_ids = Vec::with_capacity(answers.len());
            let mut correct = Vec::with_capacity(answers.len());
            for answer in &answers {
                let (id, choice) = answer
                    .split_once('=')
                    .with_context(|| format!("Expected QUESTION_ID=CHOICE, got {answer:?}"))?;
                let id: i64 = id
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid question id in {answer:?}"))?;
                let question = queries::load_question(&conn, id)?
                    .with_context(|| format!("No question with id {id}"))?;

                question_ids.push(id);
                correct.push(question.is_correct(choice));
            }

            let score = progress::record_attempt(&conn, &user, &subject, &question_ids, &correct)?;
            println!("Recorded quiz for {user}: {score:.1}%");
        }

        Commands::Progress { user } => {
            let conn = db::open(&config.db_path)?;
            terminal::display_progress(&user, &progress::user_progress(&conn, &user)?);
        }

        Commands::Recommend { subject, limit } => {
            let conn = db::open(&config.db_path)?;
            let ids = progress::recommendations(&conn, subject.as_deref(), limit)?;

            let mut questions = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(question) = queries::load_question(&conn, id)? {
                    questions.push(question);
                }
            }
            terminal::display_question_list(&questions);
        }
    }

    Ok(())
}

/// Keyword extractor backed by the configured Ollama embedding model.
fn build_extractor(config: &Config) -> KeywordExtractor {
    KeywordExtractor::with_embedder(Box::new(OllamaEmbedder::new(
        &config.ollama_url,
        &config.embedding_model,
    )))
}

fn build_generator(config: &Config) -> Result<QcmGenerator> {
    let chat = OllamaChat::new(&config.ollama_url, &config.chat_model);
    let prompts = Prompts::load(config.prompt_dir.as_deref())?;

    Ok(QcmGenerator::new(Box::new(chat), build_extractor(config), prompts)?
        .with_keywords_per_note(config.keywords_per_note)
        .with_align_threshold(config.align_threshold))
}

/// Ask `count` random questions on stdin and record the attempt.
fn run_quiz(
    conn: &rusqlite::Connection,
    user: &str,
    subject: Option<String>,
    count: u32,
) -> Result<()> {
    let filter = QuestionFilter {
        subject: subject.clone(),
        keywords: Vec::new(),
    };
    let questions = queries::load_questions(conn, &filter, count, 0, true)?;
    if questions.is_empty() {
        println!("No questions available. Run `qcm-forge generate` first.");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut question_ids = Vec::with_capacity(questions.len());
    let mut correct = Vec::with_capacity(questions.len());

    for question in &questions {
        terminal::display_question(question, false);
        print!("  Your answer (A-D): ");
        io::stdout().flush()?;

        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;

        let ok = question.is_correct(&line);
        if ok {
            println!("  {}", "Correct!".green().bold());
        } else {
            println!(
                "  {} Answer: {}",
                "Wrong.".red().bold(),
                question.answers.join(", ")
            );
        }

        if let Some(id) = question.id {
            question_ids.push(id);
            correct.push(ok);
        }
    }

    let subject = subject.unwrap_or_else(|| "Mixte".to_string());
    let score = progress::record_attempt(conn, user, &subject, &question_ids, &correct)?;
    println!("\n{}", format!("Score: {score:.1}%").bold());
    Ok(())
}
