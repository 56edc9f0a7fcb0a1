// Parser for the model's Markdown answer table.
//
// The model is asked for one table row per question:
//
//   | subject | ["kw", ...] | id | question | "QCM" | {"A": ..., "D": ...} | ["B"] |
//
// Models are sloppy about JSON inside table cells, so each structured cell
// has a fallback chain. Rows that still don't validate are logged and
// dropped; the rest of the response is kept.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex_lite::Regex;
use tracing::{debug, error, info, warn};

use crate::db::models::{Question, CHOICE_KEYS, QUESTION_TYPE_QCM};

/// Questions requested per note.
pub const EXPECTED_QUESTIONS: usize = 5;

const ROW_PATTERN: &str = r#"\|\s*([^|]+?)\s*\|\s*(\[[^\]]+\])\s*\|\s*([^|]+?)\s*\|\s*([^|]+?)\s*\|\s*"QCM"\s*\|\s*(\{[^}]+\})\s*\|\s*(\[[^\]]+\])\s*\|"#;

pub struct ResponseParser {
    row: Regex,
}

impl ResponseParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: Regex::new(ROW_PATTERN).context("Invalid answer-table pattern")?,
        })
    }

    /// Every valid question in `response`, stamped with `source_file` and
    /// the current time.
    pub fn parse_response(&self, response: &str, source_file: &str) -> Vec<Question> {
        let cleaned = clean_response(response);
        let rows: Vec<_> = self.row.captures_iter(&cleaned).collect();
        info!(source_file, rows = rows.len(), "Found candidate question rows");

        let created_at = chrono::Utc::now().to_rfc3339();
        let mut questions = Vec::new();

        for caps in &rows {
            let question_id = caps[3].trim().to_string();

            let choices = match parse_choices(&caps[5]) {
                Some(choices) => choices,
                None => {
                    error!(question_id = %question_id, raw = &caps[5], "Could not parse choices");
                    continue;
                }
            };
            let answers = parse_list(&caps[6]);

            let problems = validate(&choices, &answers);
            if !problems.is_empty() {
                error!(question_id = %question_id, problems = ?problems, "Question failed validation");
                continue;
            }

            debug!(question_id = %question_id, "Parsed question");
            questions.push(Question {
                id: None,
                subject: caps[1].trim().to_string(),
                keywords: parse_list(&caps[2]),
                question_id,
                question_text: caps[4].trim().to_string(),
                question_type: QUESTION_TYPE_QCM.to_string(),
                choices,
                answers,
                source_file: source_file.to_string(),
                created_at: created_at.clone(),
            });
        }

        if questions.len() != EXPECTED_QUESTIONS {
            warn!(
                source_file,
                expected = EXPECTED_QUESTIONS,
                got = questions.len(),
                "Unexpected number of questions"
            );
        }

        questions
    }
}

/// Drop blank lines and table separator lines.
pub fn clean_response(response: &str) -> String {
    response
        .lines()
        .filter(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with("|-")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a `{"A": "...", ...}` cell.
///
/// Tries strict JSON, then JSON after unescaping quotes, then a manual
/// `"key": "value"` split. Returns None only when nothing usable comes out.
pub fn parse_choices(raw: &str) -> Option<BTreeMap<String, String>> {
    if let Ok(choices) = serde_json::from_str(raw) {
        return Some(choices);
    }

    let unescaped = raw.replace("\\\"", "\"").replace("\\'", "'");
    if let Ok(choices) = serde_json::from_str(&unescaped) {
        debug!("Choices parsed after unescaping");
        return Some(choices);
    }

    let mut choices = BTreeMap::new();
    let body = unescaped
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim()
        .trim_end_matches(',')
        .replace("\", \"", "\",\"");
    for part in body.split("\",\"") {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches('"').trim();
        let value = value.trim().trim_matches('"').trim();
        if !key.is_empty() {
            choices.insert(key.to_string(), value.to_string());
        }
    }

    debug!(parsed = choices.len(), "Choices parsed manually");
    (!choices.is_empty()).then_some(choices)
}

/// Parse a `["a", "b"]` cell: JSON array, else a plain comma split.
pub fn parse_list(raw: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
        return items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Problems that make a question unusable; empty when it is fine.
pub fn validate(choices: &BTreeMap<String, String>, answers: &[String]) -> Vec<String> {
    let mut problems = Vec::new();

    if choices.len() != CHOICE_KEYS.len() {
        problems.push(format!("expected 4 choices, got {}", choices.len()));
    }
    if !CHOICE_KEYS.iter().all(|k| choices.contains_key(*k)) {
        problems.push("missing one of the choice keys A, B, C, D".to_string());
    }
    match answers {
        [answer] if CHOICE_KEYS.contains(&answer.as_str()) => {}
        [answer] => problems.push(format!("invalid answer {answer:?}")),
        _ => problems.push(format!("expected 1 answer, got {}", answers.len())),
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_response_drops_separators_and_blanks() {
        let raw = "| a | b |\n|---|---|\n\n   \n| c | d |";
        assert_eq!(clean_response(raw), "| a | b |\n| c | d |");
    }

    #[test]
    fn test_parse_choices_strict_json() {
        let choices = parse_choices(r#"{"A": "un", "B": "deux", "C": "trois", "D": "quatre"}"#)
            .unwrap();
        assert_eq!(choices["C"], "trois");
    }

    #[test]
    fn test_parse_choices_escaped_quotes() {
        let choices =
            parse_choices(r#"{\"A\": \"l'eau\", \"B\": \"b\", \"C\": \"c\", \"D\": \"d\"}"#)
                .unwrap();
        assert_eq!(choices["A"], "l'eau");
        assert_eq!(choices.len(), 4);
    }

    #[test]
    fn test_parse_choices_manual_fallback() {
        // Trailing comma breaks JSON; the manual split still recovers the pairs
        let choices = parse_choices(r#"{"A": "un", "B": "deux", "C": "trois", "D": "quatre",}"#)
            .unwrap();
        assert_eq!(choices.len(), 4);
        assert_eq!(choices["D"], "quatre");
    }

    #[test]
    fn test_parse_choices_manual_keeps_quoted_comma_in_value() {
        let choices = parse_choices(
            r#"{"A": "il répond "oui", puis part", "B": "deux", "C": "trois", "D": "quatre"}"#,
        )
        .unwrap();
        assert_eq!(choices.len(), 4);
        assert_eq!(choices["A"], r#"il répond "oui", puis part"#);
        assert_eq!(choices["B"], "deux");
    }

    #[test]
    fn test_parse_choices_garbage() {
        assert_eq!(parse_choices("{rien}"), None);
    }

    #[test]
    fn test_parse_list_json_and_fallback() {
        assert_eq!(parse_list(r#"["routage", "paquet"]"#), vec!["routage", "paquet"]);
        assert_eq!(parse_list("[routage, 'paquet']"), vec!["routage", "paquet"]);
        assert_eq!(parse_list(r#"["B"]"#), vec!["B"]);
    }

    #[test]
    fn test_validate() {
        let choices: BTreeMap<String, String> = CHOICE_KEYS
            .iter()
            .map(|k| (k.to_string(), "x".to_string()))
            .collect();
        assert!(validate(&choices, &["A".to_string()]).is_empty());
        assert_eq!(validate(&choices, &["E".to_string()]).len(), 1);
        assert_eq!(
            validate(&choices, &["A".to_string(), "B".to_string()]).len(),
            1
        );

        let mut three = choices.clone();
        three.remove("D");
        assert_eq!(validate(&three, &["A".to_string()]).len(), 2);
    }
}
