// Note → questions pipeline.
//
// For each note: read it, skip it if too short, extract keywords, ask the
// chat model for a question table, parse it, align the question keywords
// against everything seen so far, and store the result.

use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use super::llm::ChatModel;
use super::parser::ResponseParser;
use super::prompt::Prompts;
use crate::config::DEFAULT_KEYWORDS_PER_NOTE;
use crate::db::models::Question;
use crate::db::queries;
use crate::keywords::alignment::DEFAULT_ALIGN_THRESHOLD;
use crate::keywords::KeywordExtractor;
use crate::notes;

/// What happened to one note.
#[derive(Debug)]
pub enum NoteOutcome {
    /// Shorter than `notes::MIN_NOTE_CHARS`; no model was called.
    Skipped,
    /// The model was called but nothing usable came back.
    Failed(String),
    Generated(Vec<Question>),
}

/// Totals for one `process_folder` run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingSummary {
    pub files: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: Vec<PathBuf>,
    pub questions: usize,
}

pub struct QcmGenerator {
    chat: Box<dyn ChatModel>,
    extractor: KeywordExtractor,
    prompts: Prompts,
    parser: ResponseParser,
    keywords_per_note: usize,
    align_threshold: f64,
    show_progress: bool,
}

impl QcmGenerator {
    pub fn new(chat: Box<dyn ChatModel>, extractor: KeywordExtractor, prompts: Prompts) -> Result<Self> {
        Ok(Self {
            chat,
            extractor,
            prompts,
            parser: ResponseParser::new()?,
            keywords_per_note: DEFAULT_KEYWORDS_PER_NOTE,
            align_threshold: DEFAULT_ALIGN_THRESHOLD,
            show_progress: false,
        })
    }

    pub fn with_keywords_per_note(mut self, n: usize) -> Self {
        self.keywords_per_note = n;
        self
    }

    pub fn with_align_threshold(mut self, threshold: f64) -> Self {
        self.align_threshold = threshold;
        self
    }

    /// Draw a progress bar while processing a folder.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    /// Generate questions for one note. Only a read failure is an error;
    /// model and parsing problems come back as `NoteOutcome::Failed`.
    pub async fn analyze_note(&mut self, path: &Path) -> Result<NoteOutcome> {
        let content = notes::read_note(path)?;
        let source_file = path.display().to_string();

        if !notes::is_long_enough(&content) {
            warn!(file = %source_file, "Note too short or empty, skipping");
            return Ok(NoteOutcome::Skipped);
        }

        let keywords = match self
            .extractor
            .extract_keywords(&content, self.keywords_per_note)
            .await
        {
            Ok(keywords) => keywords,
            Err(e) => {
                error!(file = %source_file, error = %e, "Keyword extraction failed");
                return Ok(NoteOutcome::Failed(format!("keyword extraction: {e}")));
            }
        };
        debug!(file = %source_file, keywords = ?keywords, "Suggested keywords");

        let user_prompt = self.prompts.user_prompt(&content, &keywords);
        let response = match self.chat.chat(&self.prompts.system, &user_prompt).await {
            Ok(response) => response,
            Err(e) => {
                error!(file = %source_file, error = %e, "Chat model call failed");
                return Ok(NoteOutcome::Failed(format!("chat model: {e}")));
            }
        };
        debug!(file = %source_file, response = %response, "Raw model response");

        let mut questions = self.parser.parse_response(&response, &source_file);
        if questions.is_empty() {
            return Ok(NoteOutcome::Failed("no valid questions in response".to_string()));
        }

        for question in &mut questions {
            match self
                .extractor
                .align_keywords(&question.keywords, self.align_threshold)
                .await
            {
                Ok(aligned) => question.keywords = aligned,
                Err(e) => warn!(
                    question_id = %question.question_id,
                    error = %e,
                    "Keyword alignment failed, keeping keywords as written"
                ),
            }
        }

        info!(file = %source_file, questions = questions.len(), "Generated questions");
        Ok(NoteOutcome::Generated(questions))
    }

    /// Process every note under `dir` and store the questions in `conn`.
    pub async fn process_folder(&mut self, dir: &Path, conn: &Connection) -> Result<ProcessingSummary> {
        let files = notes::scan_folder(dir)?;
        info!(folder = %dir.display(), files = files.len(), "Processing notes");

        let mut summary = ProcessingSummary {
            files: files.len(),
            ..Default::default()
        };

        let pb = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Notes [{bar:30}] {pos}/{len} ({eta}) {msg}")?,
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        for path in &files {
            if let Some(name) = path.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }

            match self.analyze_note(path).await {
                Ok(NoteOutcome::Generated(questions)) => {
                    let mut stored = 0;
                    for question in &questions {
                        match queries::insert_question(conn, question) {
                            Ok(_) => stored += 1,
                            Err(e) => error!(
                                question_id = %question.question_id,
                                error = %e,
                                "Failed to store question, skipping"
                            ),
                        }
                    }
                    summary.processed += 1;
                    summary.questions += stored;
                }
                Ok(NoteOutcome::Skipped) => summary.skipped += 1,
                Ok(NoteOutcome::Failed(reason)) => {
                    warn!(file = %path.display(), reason = %reason, "Note produced no questions");
                    summary.failed.push(path.clone());
                }
                Err(e) => {
                    error!(file = %path.display(), error = %e, "Failed to read note");
                    summary.failed.push(path.clone());
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            files = summary.files,
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            questions = summary.questions,
            "Folder processed"
        );

        Ok(summary)
    }
}

