// Quiz progress: attempts per user and answer counters per question.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

use super::models::UserProgress;

/// Success rate under which a question is recommended again early.
pub const STRUGGLING_SUCCESS_RATE: f64 = 0.3;

/// Record one completed quiz and bump the per-question counters.
///
/// `question_ids` and `correct` are parallel: `correct[i]` says whether the
/// user answered `question_ids[i]` correctly. Returns the score (0 to 100).
pub fn record_attempt(
    conn: &Connection,
    user_id: &str,
    subject: &str,
    question_ids: &[i64],
    correct: &[bool],
) -> Result<f64> {
    if question_ids.is_empty() {
        bail!("A quiz attempt needs at least one question");
    }
    if question_ids.len() != correct.len() {
        bail!(
            "Got {} questions but {} answers",
            question_ids.len(),
            correct.len()
        );
    }

    let total = question_ids.len() as i64;
    let correct_count = correct.iter().filter(|c| **c).count() as i64;
    let score = correct_count as f64 / total as f64 * 100.0;
    let now = chrono::Utc::now().to_rfc3339();

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO quiz_attempts
            (user_id, quiz_date, subject, score, total_questions, correct_answers)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![user_id, now, subject, score, total, correct_count],
    )?;

    for (question_id, ok) in question_ids.iter().zip(correct) {
        tx.execute(
            "INSERT INTO question_stats (question_id, times_shown, times_correct, last_shown)
             VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(question_id) DO UPDATE SET
                times_shown = times_shown + 1,
                times_correct = times_correct + excluded.times_correct,
                last_shown = excluded.last_shown",
            params![question_id, *ok as i64, now],
        )?;
    }

    tx.commit()?;

    debug!(user_id, subject, score, questions = total, "Recorded quiz attempt");
    Ok(score)
}

/// Summarize a user's quiz history. A user with no attempts gets zeros.
pub fn user_progress(conn: &Connection, user_id: &str) -> Result<UserProgress> {
    let (total_quizzes, average_score): (i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), AVG(score) FROM quiz_attempts WHERE user_id = ?1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT subject, AVG(score) FROM quiz_attempts WHERE user_id = ?1 GROUP BY subject",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut subject_scores = BTreeMap::new();
    for row in rows {
        let (subject, avg) = row?;
        subject_scores.insert(subject, avg);
    }

    let mut stmt = conn.prepare(
        "SELECT quiz_date, score FROM quiz_attempts WHERE user_id = ?1 ORDER BY quiz_date, id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut progress_over_time = Vec::new();
    for row in rows {
        progress_over_time.push(row?);
    }

    let (strongest_subject, weakest_subject) = extremes(&subject_scores);

    Ok(UserProgress {
        total_quizzes,
        average_score: average_score.unwrap_or(0.0),
        subjects_taken: subject_scores.keys().cloned().collect::<BTreeSet<_>>(),
        progress_over_time,
        strongest_subject,
        weakest_subject,
    })
}

/// Best and worst subject by average score. Iteration is alphabetical and
/// only a strictly better score replaces the current pick, so ties go to the
/// alphabetically first subject.
fn extremes(
    scores: &BTreeMap<String, f64>,
) -> (Option<(String, f64)>, Option<(String, f64)>) {
    let mut best: Option<(&String, f64)> = None;
    let mut worst: Option<(&String, f64)> = None;

    for (subject, &avg) in scores {
        if best.map_or(true, |(_, b)| avg > b) {
            best = Some((subject, avg));
        }
        if worst.map_or(true, |(_, w)| avg < w) {
            worst = Some((subject, avg));
        }
    }

    (
        best.map(|(s, a)| (s.clone(), a)),
        worst.map(|(s, a)| (s.clone(), a)),
    )
}

/// Question ids to practice next, optionally within one subject.
///
/// Never-shown questions come first, then those answered correctly less than
/// 30% of the time, then the rest. Order within a group is random. Answer
/// counters are shared by every user of the database.
pub fn recommendations(conn: &Connection, subject: Option<&str>, limit: u32) -> Result<Vec<i64>> {
    let mut sql = String::from(
        "SELECT q.id,
                CASE
                    WHEN COALESCE(qs.times_shown, 0) = 0 THEN 1
                    WHEN CAST(qs.times_correct AS REAL) / qs.times_shown < ?1 THEN 2
                    ELSE 3
                END AS priority
         FROM questions q
         LEFT JOIN question_stats qs ON qs.question_id = q.id",
    );
    let mut values = vec![Value::Real(STRUGGLING_SUCCESS_RATE)];

    if let Some(subject) = subject.filter(|s| !s.is_empty()) {
        sql.push_str(" WHERE q.subject = ?2");
        values.push(Value::Text(subject.to_string()));
    }

    sql.push_str(&format!(
        " ORDER BY priority, RANDOM() LIMIT ?{}",
        values.len() + 1
    ));
    values.push(Value::Integer(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(items: &[(&str, f64)]) -> BTreeMap<String, f64> {
        items.iter().map(|(s, v)| (s.to_string(), *v)).collect()
    }

    #[test]
    fn test_extremes_empty() {
        assert_eq!(extremes(&BTreeMap::new()), (None, None));
    }

    #[test]
    fn test_extremes_picks_best_and_worst() {
        let (best, worst) = extremes(&scores(&[
            ("Réseaux", 80.0),
            ("Algèbre", 40.0),
            ("Histoire", 60.0),
        ]));
        assert_eq!(best, Some(("Réseaux".to_string(), 80.0)));
        assert_eq!(worst, Some(("Algèbre".to_string(), 40.0)));
    }

    #[test]
    fn test_extremes_ties_go_alphabetical() {
        let (best, worst) = extremes(&scores(&[("Chimie", 50.0), ("Biologie", 50.0)]));
        assert_eq!(best.unwrap().0, "Biologie");
        assert_eq!(worst.unwrap().0, "Biologie");
    }
}
