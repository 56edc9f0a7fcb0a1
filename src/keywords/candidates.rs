// Candidate generation: the union of four cheap heuristics.
//
//   1. named-entity spans from the annotator
//   2. base noun phrases
//   3. single nouns, proper nouns and adjectives
//   4. the top TF-IDF terms of the note
//
// Everything is lower-cased, then filtered down to plain words: more than two
// characters, only letters (accented Latin included), whitespace and hyphens.
// Relevance scoring decides which of these actually describe the note.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::error::{KeywordError, KeywordResult};
use super::tfidf::TFIDF_TOP_TERMS;
use super::traits::{Annotator, TermWeighter};

/// Build the candidate set for one document.
///
/// A TF-IDF failure only removes that method's contribution. An annotator
/// failure is an error: without it three of the four methods are gone.
pub fn generate_candidates(
    text: &str,
    annotator: &dyn Annotator,
    weighter: &dyn TermWeighter,
) -> KeywordResult<BTreeSet<String>> {
    let annotation = annotator.annotate(text).map_err(KeywordError::Annotation)?;

    let mut raw: Vec<String> = Vec::new();
    raw.extend(annotation.entities.iter().map(|e| e.text.to_lowercase()));
    raw.extend(annotation.noun_phrases.iter().map(|p| p.to_lowercase()));
    raw.extend(
        annotation
            .tokens
            .iter()
            .filter(|t| t.pos.is_content())
            .map(|t| t.text.to_lowercase()),
    );

    match weighter.top_terms(text, TFIDF_TOP_TERMS) {
        Ok(terms) => raw.extend(terms.iter().map(|t| t.to_lowercase())),
        Err(e) => warn!(error = %e, "TF-IDF produced no terms, continuing without them"),
    }

    let before = raw.len();
    let candidates: BTreeSet<String> = raw.into_iter().filter(|c| is_valid_candidate(c)).collect();

    debug!(
        raw = before,
        kept = candidates.len(),
        entities = annotation.entities.len(),
        noun_phrases = annotation.noun_phrases.len(),
        "Generated keyword candidates"
    );

    Ok(candidates)
}

/// Keep strings longer than two characters made only of letters, whitespace
/// and hyphens. Digits, apostrophes and other punctuation disqualify.
pub fn is_valid_candidate(candidate: &str) -> bool {
    candidate.chars().count() > 2 && candidate.chars().all(is_candidate_char)
}

fn is_candidate_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || c.is_whitespace()
        || c == '-'
        || (('\u{C0}'..='\u{FF}').contains(&c) && c != '×' && c != '÷')
        || matches!(c, 'œ' | 'Œ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_accented_words() {
        assert!(is_valid_candidate("réseau"));
        assert!(is_valid_candidate("apprentissage automatique"));
        assert!(is_valid_candidate("sous-réseau"));
        assert!(is_valid_candidate("cœur"));
    }

    #[test]
    fn test_rejects_digits_and_punctuation() {
        assert!(!is_valid_candidate("module1"));
        assert!(!is_valid_candidate("l'algorithme"));
        assert!(!is_valid_candidate("tcp/ip"));
        assert!(!is_valid_candidate("2×3"));
    }

    #[test]
    fn test_rejects_short_strings() {
        assert!(!is_valid_candidate("ip"));
        assert!(!is_valid_candidate("é"));
        assert!(is_valid_candidate("été"));
    }
}
