// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so the generator and parser can build them
// without depending on rusqlite directly.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The only question type the generator produces.
pub const QUESTION_TYPE_QCM: &str = "QCM";

/// Valid choice keys, in display order.
pub const CHOICE_KEYS: [&str; 4] = ["A", "B", "C", "D"];

/// A multiple-choice question generated from one note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Database row id (None until stored)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub subject: String,
    /// Keywords as stored (JSON-encoded in the DB), after alignment
    pub keywords: Vec<String>,
    /// Identifier the model gave the question inside its answer table
    pub question_id: String,
    pub question_text: String,
    pub question_type: String,
    /// Choice key ("A".."D") to choice text (JSON-encoded in the DB)
    pub choices: BTreeMap<String, String>,
    /// Correct choice keys (JSON-encoded in the DB)
    pub answers: Vec<String>,
    /// Path of the note the question was generated from
    pub source_file: String,
    pub created_at: String,
}

impl Question {
    /// Whether `choice` (case-insensitive) is one of the correct answers.
    pub fn is_correct(&self, choice: &str) -> bool {
        let choice = choice.trim().to_uppercase();
        self.answers.iter().any(|a| a.eq_ignore_ascii_case(&choice))
    }
}

/// Optional filters shared by the random and list queries.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    /// Matches questions carrying any of these keywords (substring match on
    /// the stored JSON array)
    pub keywords: Vec<String>,
}

/// Aggregate numbers about the question bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub total_questions: i64,
    pub total_subjects: i64,
    pub questions_per_subject: BTreeMap<String, i64>,
    /// `created_at` of the newest question, None for an empty bank
    pub latest_question: Option<String>,
    pub total_keywords: usize,
}

/// One user's quiz history, summarized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProgress {
    pub total_quizzes: i64,
    pub average_score: f64,
    pub subjects_taken: BTreeSet<String>,
    /// (quiz date, score) in chronological order
    pub progress_over_time: Vec<(String, f64)>,
    /// (subject, average score)
    pub strongest_subject: Option<(String, f64)>,
    pub weakest_subject: Option<(String, f64)>,
}
