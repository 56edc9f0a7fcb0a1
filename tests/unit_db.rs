// Question bank and progress tracking against an in-memory SQLite database.

use std::collections::BTreeMap;

use rusqlite::Connection;

use qcm_forge::db::models::{Question, QuestionFilter, QUESTION_TYPE_QCM};
use qcm_forge::db::{progress, queries, schema};

fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    schema::create_tables(&conn).unwrap();
    conn
}

fn question(subject: &str, keywords: &[&str], text: &str, created_at: &str) -> Question {
    let choices: BTreeMap<String, String> = [
        ("A", "Un routeur"),
        ("B", "Un câble"),
        ("C", "Un écran"),
        ("D", "Un clavier"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Question {
        id: None,
        subject: subject.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        question_id: "Q1".to_string(),
        question_text: text.to_string(),
        question_type: QUESTION_TYPE_QCM.to_string(),
        choices,
        answers: vec!["A".to_string()],
        source_file: "notes/cours.md".to_string(),
        created_at: created_at.to_string(),
    }
}

/// Three questions: two in Réseaux, one in Algèbre. Returns their ids.
fn seed(conn: &Connection) -> Vec<i64> {
    vec![
        queries::insert_question(
            conn,
            &question(
                "Réseaux",
                &["routage", "paquet"],
                "Quel équipement relie deux réseaux ?",
                "2026-01-01T10:00:00Z",
            ),
        )
        .unwrap(),
        queries::insert_question(
            conn,
            &question(
                "Réseaux",
                &["adresse ip"],
                "Combien d'octets compte une adresse IPv4 ?",
                "2026-01-02T10:00:00Z",
            ),
        )
        .unwrap(),
        queries::insert_question(
            conn,
            &question(
                "Algèbre",
                &["matrice"],
                "Quel est le rang d'une matrice identité 3x3 ?",
                "2026-01-03T10:00:00Z",
            ),
        )
        .unwrap(),
    ]
}

// ============================================================
// Question store
// ============================================================

#[test]
fn insert_and_load_roundtrip_keeps_json_columns() {
    let conn = test_db();
    let original = question("Réseaux", &["routage"], "Q ?", "2026-01-01T10:00:00Z");
    let id = queries::insert_question(&conn, &original).unwrap();

    let loaded = queries::load_question(&conn, id).unwrap().unwrap();
    assert_eq!(loaded.id, Some(id));
    assert_eq!(Question { id: None, ..loaded }, original);
}

#[test]
fn load_missing_question_is_none() {
    let conn = test_db();
    assert!(queries::load_question(&conn, 42).unwrap().is_none());
}

#[test]
fn random_question_respects_filters() {
    let conn = test_db();
    seed(&conn);

    let filter = QuestionFilter {
        subject: Some("Algèbre".to_string()),
        keywords: vec![],
    };
    let q = queries::load_random_question(&conn, &filter).unwrap().unwrap();
    assert_eq!(q.subject, "Algèbre");

    let filter = QuestionFilter {
        subject: None,
        keywords: vec!["paquet".to_string()],
    };
    let q = queries::load_random_question(&conn, &filter).unwrap().unwrap();
    assert!(q.keywords.contains(&"paquet".to_string()));

    let filter = QuestionFilter {
        subject: Some("Histoire".to_string()),
        keywords: vec![],
    };
    assert!(queries::load_random_question(&conn, &filter).unwrap().is_none());
}

#[test]
fn list_is_newest_first_with_paging() {
    let conn = test_db();
    let ids = seed(&conn);

    let all = queries::load_questions(&conn, &QuestionFilter::default(), 10, 0, false).unwrap();
    let listed: Vec<i64> = all.iter().filter_map(|q| q.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let page = queries::load_questions(&conn, &QuestionFilter::default(), 1, 1, false).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, Some(ids[1]));

    let shuffled = queries::load_questions(&conn, &QuestionFilter::default(), 10, 0, true).unwrap();
    assert_eq!(shuffled.len(), 3);
}

#[test]
fn subjects_and_keywords_are_distinct_and_sorted() {
    let conn = test_db();
    seed(&conn);

    assert_eq!(
        queries::get_subjects(&conn).unwrap(),
        vec!["Algèbre", "Réseaux"]
    );
    assert_eq!(
        queries::get_keywords(&conn).unwrap(),
        vec!["adresse ip", "matrice", "paquet", "routage"]
    );
}

#[test]
fn stats_on_empty_bank() {
    let conn = test_db();
    let stats = queries::get_stats(&conn).unwrap();
    assert_eq!(stats.total_questions, 0);
    assert_eq!(stats.total_subjects, 0);
    assert!(stats.questions_per_subject.is_empty());
    assert_eq!(stats.latest_question, None);
    assert_eq!(stats.total_keywords, 0);
}

#[test]
fn stats_count_per_subject() {
    let conn = test_db();
    seed(&conn);

    let stats = queries::get_stats(&conn).unwrap();
    assert_eq!(stats.total_questions, 3);
    assert_eq!(stats.total_subjects, 2);
    assert_eq!(stats.questions_per_subject["Réseaux"], 2);
    assert_eq!(stats.questions_per_subject["Algèbre"], 1);
    assert_eq!(stats.latest_question.as_deref(), Some("2026-01-03T10:00:00Z"));
    assert_eq!(stats.total_keywords, 4);
}

#[test]
fn search_matches_text_subject_and_keywords() {
    let conn = test_db();
    seed(&conn);

    assert_eq!(queries::search_questions(&conn, "IPv4").unwrap().len(), 1);
    assert_eq!(queries::search_questions(&conn, "Réseaux").unwrap().len(), 2);
    assert_eq!(queries::search_questions(&conn, "matrice").unwrap().len(), 1);
    assert!(queries::search_questions(&conn, "photosynthèse")
        .unwrap()
        .is_empty());
}

// ============================================================
// Progress
// ============================================================

#[test]
fn record_attempt_scores_and_counts() {
    let conn = test_db();
    let ids = seed(&conn);

    let score =
        progress::record_attempt(&conn, "alice", "Réseaux", &ids[..2], &[true, false]).unwrap();
    assert!((score - 50.0).abs() < 1e-9);

    progress::record_attempt(&conn, "alice", "Réseaux", &ids[..1], &[true]).unwrap();

    let (shown, correct): (i64, i64) = conn
        .query_row(
            "SELECT times_shown, times_correct FROM question_stats WHERE question_id = ?1",
            [ids[0]],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((shown, correct), (2, 2));
}

#[test]
fn record_attempt_rejects_bad_input() {
    let conn = test_db();
    let ids = seed(&conn);

    assert!(progress::record_attempt(&conn, "alice", "Réseaux", &[], &[]).is_err());
    assert!(progress::record_attempt(&conn, "alice", "Réseaux", &ids, &[true]).is_err());

    let attempts: i64 = conn
        .query_row("SELECT COUNT(*) FROM quiz_attempts", [], |row| row.get(0))
        .unwrap();
    assert_eq!(attempts, 0);
}

#[test]
fn user_progress_without_attempts() {
    let conn = test_db();
    let p = progress::user_progress(&conn, "nobody").unwrap();
    assert_eq!(p.total_quizzes, 0);
    assert_eq!(p.average_score, 0.0);
    assert!(p.subjects_taken.is_empty());
    assert!(p.strongest_subject.is_none());
    assert!(p.weakest_subject.is_none());
}

#[test]
fn user_progress_summarizes_history() {
    let conn = test_db();
    let ids = seed(&conn);

    progress::record_attempt(&conn, "alice", "Réseaux", &ids[..2], &[true, true]).unwrap();
    progress::record_attempt(&conn, "alice", "Algèbre", &ids[2..], &[false]).unwrap();
    progress::record_attempt(&conn, "bob", "Algèbre", &ids[2..], &[true]).unwrap();

    let p = progress::user_progress(&conn, "alice").unwrap();
    assert_eq!(p.total_quizzes, 2);
    assert!((p.average_score - 50.0).abs() < 1e-9);
    assert_eq!(p.subjects_taken.len(), 2);
    assert_eq!(p.progress_over_time.len(), 2);
    assert_eq!(p.strongest_subject, Some(("Réseaux".to_string(), 100.0)));
    assert_eq!(p.weakest_subject, Some(("Algèbre".to_string(), 0.0)));
}

#[test]
fn recommendations_put_unseen_then_struggling_first() {
    let conn = test_db();
    let ids = seed(&conn);

    // ids[0]: answered right every time; ids[1]: always wrong; ids[2]: never shown
    progress::record_attempt(&conn, "alice", "Réseaux", &ids[..2], &[true, false]).unwrap();

    let recommended = progress::recommendations(&conn, None, 10).unwrap();
    assert_eq!(recommended, vec![ids[2], ids[1], ids[0]]);

    let in_subject = progress::recommendations(&conn, Some("Réseaux"), 10).unwrap();
    assert_eq!(in_subject, vec![ids[1], ids[0]]);

    assert_eq!(progress::recommendations(&conn, None, 1).unwrap(), vec![ids[2]]);
}
