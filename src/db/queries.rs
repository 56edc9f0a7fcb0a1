// Question queries: insert, lookup, filtering, stats and search.
//
// Every question-bank interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use super::models::{Question, QuestionFilter, QuestionStats};

const QUESTION_COLUMNS: &str = "id, subject, keywords, question_id, question_text, question_type,
     choices, answers, source_file, created_at";

/// Store a question and return its row id.
pub fn insert_question(conn: &Connection, question: &Question) -> Result<i64> {
    conn.execute(
        "INSERT INTO questions
            (subject, keywords, question_id, question_text, question_type,
             choices, answers, source_file, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            question.subject,
            serde_json::to_string(&question.keywords)?,
            question.question_id,
            question.question_text,
            question.question_type,
            serde_json::to_string(&question.choices)?,
            serde_json::to_string(&question.answers)?,
            question.source_file,
            question.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Load one question by its database id.
pub fn load_question(conn: &Connection, id: i64) -> Result<Option<Question>> {
    let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], row_to_question).optional()?;
    Ok(result)
}

/// Load one random question matching the filter.
pub fn load_random_question(conn: &Connection, filter: &QuestionFilter) -> Result<Option<Question>> {
    let (where_clause, values) = filter_clause(filter);
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM questions{where_clause} ORDER BY RANDOM() LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt
        .query_row(params_from_iter(values.iter()), row_to_question)
        .optional()?;
    Ok(result)
}

/// Load a page of questions matching the filter, newest first or shuffled.
pub fn load_questions(
    conn: &Connection,
    filter: &QuestionFilter,
    limit: u32,
    offset: u32,
    shuffle: bool,
) -> Result<Vec<Question>> {
    let (where_clause, mut values) = filter_clause(filter);
    let order = if shuffle {
        "RANDOM()"
    } else {
        "created_at DESC, id DESC"
    };
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM questions{where_clause} ORDER BY {order} LIMIT ? OFFSET ?"
    );
    values.push(Value::Integer(limit as i64));
    values.push(Value::Integer(offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), row_to_question)?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok(questions)
}

/// All distinct subjects, alphabetically.
pub fn get_subjects(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT subject FROM questions ORDER BY subject")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut subjects = Vec::new();
    for row in rows {
        subjects.push(row?);
    }
    Ok(subjects)
}

/// All distinct keywords across the bank, alphabetically.
pub fn get_keywords(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT keywords FROM questions")?;
    let rows = stmt.query_map([], |row| json_column::<Vec<String>>(row, 0))?;

    let mut keywords = BTreeSet::new();
    for row in rows {
        keywords.extend(row?);
    }
    Ok(keywords.into_iter().collect())
}

/// Totals, per-subject counts and the newest question's timestamp.
pub fn get_stats(conn: &Connection) -> Result<QuestionStats> {
    let total_questions: i64 =
        conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
    let total_subjects: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT subject) FROM questions",
        [],
        |row| row.get(0),
    )?;
    let latest_question: Option<String> = conn
        .query_row(
            "SELECT created_at FROM questions ORDER BY created_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let mut stmt = conn.prepare("SELECT subject, COUNT(*) FROM questions GROUP BY subject")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    let mut questions_per_subject = BTreeMap::new();
    for row in rows {
        let (subject, count) = row?;
        questions_per_subject.insert(subject, count);
    }

    Ok(QuestionStats {
        total_questions,
        total_subjects,
        questions_per_subject,
        latest_question,
        total_keywords: get_keywords(conn)?.len(),
    })
}

/// Substring search over question text, subject and keywords, newest first.
pub fn search_questions(conn: &Connection, query: &str) -> Result<Vec<Question>> {
    let pattern = format!("%{query}%");
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM questions
         WHERE question_text LIKE ?1 OR subject LIKE ?1 OR keywords LIKE ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], row_to_question)?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok(questions)
}

/// Build a WHERE clause (with leading space) and its positional values.
///
/// Keyword filters match if any keyword appears in the stored JSON array.
fn filter_clause(filter: &QuestionFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(subject) = filter.subject.as_deref().filter(|s| !s.is_empty()) {
        conditions.push("subject = ?".to_string());
        values.push(Value::Text(subject.to_string()));
    }

    if !filter.keywords.is_empty() {
        let any = vec!["keywords LIKE ?"; filter.keywords.len()].join(" OR ");
        conditions.push(format!("({any})"));
        values.extend(
            filter
                .keywords
                .iter()
                .map(|k| Value::Text(format!("%{k}%"))),
        );
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn row_to_question(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: Some(row.get(0)?),
        subject: row.get(1)?,
        keywords: json_column(row, 2)?,
        question_id: row.get(3)?,
        question_text: row.get(4)?,
        question_type: row.get(5)?,
        choices: json_column(row, 6)?,
        answers: json_column(row, 7)?,
        source_file: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Decode a JSON-encoded TEXT column.
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
