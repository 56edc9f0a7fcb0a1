// Rule-based French annotator.
//
// A lightweight stand-in for a statistical parser: tokenizes French text,
// assigns coarse part-of-speech tags from stop-word membership, capitalization
// and suffix rules, then derives entity spans and base noun phrases from the
// tags. Anything it cannot classify becomes a noun.
//
// Noun phrases follow the pattern (ADJ)* (NOUN|PROPN)+ (ADJ)*, since French
// puts most adjectives after the noun ("apprentissage automatique").

use std::collections::HashSet;

use anyhow::Result;
use stop_words::{get, LANGUAGE};

use super::traits::{Annotation, Annotator, EntitySpan, PosTag, TaggedToken};

/// Suffixes that mark a (likely) adjective once stop words are excluded.
const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ique", "iques", "able", "ables", "ible", "ibles", "eux", "euse", "euses", "if", "ive",
    "ifs", "ives", "el", "elle", "els", "elles", "al", "ale", "ales", "aux", "aire", "aires",
    "ée", "ées", "és", "ant", "ante", "ants", "antes",
];

/// Conjugated verb endings that are rarely nouns.
const VERB_SUFFIXES: &[&str] = &["aient", "ait", "èrent", "issent", "issait", "eront", "erait"];

/// Words after which an -er/-ir/-re form is read as an infinitive.
const INFINITIVE_MARKERS: &[&str] = &[
    "de", "d'", "à", "pour", "sans", "peut", "peuvent", "doit", "doivent", "faut", "va", "vont",
    "permet", "permettent",
];

/// Particles allowed inside a multi-word proper name ("Banque de France").
const NAME_CONNECTORS: &[&str] = &["de", "du", "des", "d'"];

/// Prepositions that usually introduce a place name.
const LOCATION_MARKERS: &[&str] = &["à", "en", "au", "aux"];

pub struct RuleAnnotator {
    stop_words: HashSet<String>,
}

impl Default for RuleAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleAnnotator {
    pub fn new() -> Self {
        let stop_words: HashSet<String> = get(LANGUAGE::French)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self { stop_words }
    }

    fn tag(&self, word: &str, sentence_start: bool, prev_lower: Option<&str>) -> PosTag {
        if word.chars().any(|c| c.is_ascii_digit()) {
            return PosTag::Number;
        }

        let lower = word.to_lowercase();
        let bare = lower.trim_end_matches(['\'', '’']);
        if lower.ends_with(['\'', '’']) || self.stop_words.contains(bare) {
            return PosTag::Function;
        }

        let starts_upper = word.chars().next().is_some_and(|c| c.is_uppercase());
        let acronym = word.chars().count() > 1 && word.chars().all(|c| c.is_uppercase());
        if starts_upper && (!sentence_start || acronym) {
            return PosTag::ProperNoun;
        }

        if lower.ends_with("ment") && lower.chars().count() > 6 {
            return PosTag::Adverb;
        }
        if VERB_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return PosTag::Verb;
        }
        if prev_lower.is_some_and(|p| INFINITIVE_MARKERS.contains(&p))
            && ["er", "ir", "re"].iter().any(|s| lower.ends_with(s))
        {
            return PosTag::Verb;
        }
        if lower.chars().count() > 3 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return PosTag::Adjective;
        }

        PosTag::Noun
    }
}

impl Annotator for RuleAnnotator {
    fn annotate(&self, text: &str) -> Result<Annotation> {
        let raw = tokenize(text);

        let mut tokens = Vec::with_capacity(raw.len());
        let mut prev_lower: Option<String> = None;
        for t in &raw {
            let pos = if t.is_word {
                self.tag(&t.text, t.sentence_start, prev_lower.as_deref())
            } else {
                PosTag::Punctuation
            };
            prev_lower = t.is_word.then(|| t.text.to_lowercase());
            tokens.push(TaggedToken {
                text: t.text.clone(),
                pos,
                sentence_idx: t.sentence_idx,
            });
        }

        Ok(Annotation {
            entities: find_entities(&tokens),
            noun_phrases: find_noun_phrases(&tokens),
            tokens,
        })
    }
}

struct RawToken {
    text: String,
    is_word: bool,
    sentence_idx: usize,
    sentence_start: bool,
}

/// Split text into word and punctuation tokens with sentence indices.
///
/// Elided articles stay attached to their apostrophe ("l'", "d'") and form
/// their own token. Hyphens inside a word are kept ("sous-réseau"). Newlines
/// end a sentence, since notes are mostly headings and bullet lines.
fn tokenize(text: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut sentence_idx = 0usize;
    let mut at_sentence_start = true;

    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        if c.is_alphanumeric() {
            word.push(c);
        } else if c == '-' && !word.is_empty() && next.is_some_and(|n| n.is_alphanumeric()) {
            word.push(c);
        } else if (c == '\'' || c == '’') && !word.is_empty() {
            word.push(c);
            flush(&mut word, &mut tokens, sentence_idx, &mut at_sentence_start);
        } else {
            flush(&mut word, &mut tokens, sentence_idx, &mut at_sentence_start);
            if c.is_whitespace() && c != '\n' {
                continue;
            }
            if c != '\n' {
                tokens.push(RawToken {
                    text: c.to_string(),
                    is_word: false,
                    sentence_idx,
                    sentence_start: false,
                });
            }
            if matches!(c, '.' | '!' | '?' | '\n') && !at_sentence_start {
                sentence_idx += 1;
                at_sentence_start = true;
            }
        }
    }
    flush(&mut word, &mut tokens, sentence_idx, &mut at_sentence_start);

    tokens
}

fn flush(
    word: &mut String,
    tokens: &mut Vec<RawToken>,
    sentence_idx: usize,
    at_sentence_start: &mut bool,
) {
    if !word.is_empty() {
        tokens.push(RawToken {
            text: std::mem::take(word),
            is_word: true,
            sentence_idx,
            sentence_start: *at_sentence_start,
        });
        *at_sentence_start = false;
    }
}

/// Maximal runs of proper nouns, optionally joined by name particles.
fn find_entities(tokens: &[TaggedToken]) -> Vec<EntitySpan> {
    let mut entities = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if tokens[i].pos != PosTag::ProperNoun {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        loop {
            if end < tokens.len()
                && tokens[end].pos == PosTag::ProperNoun
                && tokens[end].sentence_idx == tokens[start].sentence_idx
            {
                end += 1;
            } else if end + 1 < tokens.len()
                && NAME_CONNECTORS.contains(&tokens[end].text.to_lowercase().as_str())
                && tokens[end + 1].pos == PosTag::ProperNoun
                && tokens[end + 1].sentence_idx == tokens[start].sentence_idx
            {
                end += 2;
            } else {
                break;
            }
        }

        let label = match start.checked_sub(1).map(|p| tokens[p].text.to_lowercase()) {
            Some(prev) if LOCATION_MARKERS.contains(&prev.as_str()) => "LOC",
            _ => "MISC",
        };

        entities.push(EntitySpan {
            text: join_tokens(&tokens[start..end]),
            label: label.to_string(),
        });
        i = end;
    }

    entities
}

/// Base noun phrases: (ADJ)* (NOUN|PROPN)+ (ADJ)*, non-overlapping, left to right.
fn find_noun_phrases(tokens: &[TaggedToken]) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let sentence = tokens[i].sentence_idx;
        let same = |j: usize| j < tokens.len() && tokens[j].sentence_idx == sentence;

        let mut end = i;
        while same(end) && tokens[end].pos == PosTag::Adjective {
            end += 1;
        }
        let noun_start = end;
        while same(end) && tokens[end].pos.is_noun() {
            end += 1;
        }
        if end == noun_start {
            i += 1;
            continue;
        }
        while same(end) && tokens[end].pos == PosTag::Adjective {
            end += 1;
        }

        phrases.push(join_tokens(&tokens[i..end]));
        i = end;
    }

    phrases
}

fn join_tokens(tokens: &[TaggedToken]) -> String {
    // Elided particles ("d'") attach to the next word without a space.
    let mut out = String::new();
    for t in tokens {
        if !out.is_empty() && !out.ends_with(['\'', '’']) {
            out.push(' ');
        }
        out.push_str(&t.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_of(annotation: &Annotation, word: &str) -> Option<PosTag> {
        annotation
            .tokens
            .iter()
            .find(|t| t.text == word)
            .map(|t| t.pos)
    }

    #[test]
    fn test_tokenize_splits_elision() {
        let tokens = tokenize("L'apprentissage d'un modèle.");
        let words: Vec<&str> = tokens
            .iter()
            .filter(|t| t.is_word)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(words, vec!["L'", "apprentissage", "d'", "un", "modèle"]);
    }

    #[test]
    fn test_tokenize_keeps_hyphenated_words() {
        let tokens = tokenize("Un sous-réseau IP.");
        assert!(tokens.iter().any(|t| t.text == "sous-réseau"));
    }

    #[test]
    fn test_tokenize_sentence_indices() {
        let tokens = tokenize("Première phrase. Deuxième phrase\nTroisième");
        let last = tokens.last().unwrap();
        assert_eq!(last.text, "Troisième");
        assert_eq!(last.sentence_idx, 2);
        assert!(last.sentence_start);
    }

    #[test]
    fn test_stop_words_are_function_words() {
        let annotator = RuleAnnotator::new();
        let a = annotator.annotate("le réseau et la machine").unwrap();
        assert_eq!(tags_of(&a, "le"), Some(PosTag::Function));
        assert_eq!(tags_of(&a, "et"), Some(PosTag::Function));
        assert_eq!(tags_of(&a, "réseau"), Some(PosTag::Noun));
    }

    #[test]
    fn test_adjective_suffix() {
        let annotator = RuleAnnotator::new();
        let a = annotator.annotate("un apprentissage automatique").unwrap();
        assert_eq!(tags_of(&a, "automatique"), Some(PosTag::Adjective));
    }

    #[test]
    fn test_digits_are_numbers() {
        let annotator = RuleAnnotator::new();
        let a = annotator.annotate("le module1 compte 42 pages").unwrap();
        assert_eq!(tags_of(&a, "module1"), Some(PosTag::Number));
        assert_eq!(tags_of(&a, "42"), Some(PosTag::Number));
    }

    #[test]
    fn test_mid_sentence_capital_is_proper_noun() {
        let annotator = RuleAnnotator::new();
        let a = annotator
            .annotate("Le protocole a été conçu par Vinton Cerf aux États-Unis.")
            .unwrap();
        assert_eq!(tags_of(&a, "Vinton"), Some(PosTag::ProperNoun));
        let texts: Vec<&str> = a.entities.iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Vinton Cerf"), "entities: {texts:?}");
        let us = a.entities.iter().find(|e| e.text == "États-Unis").unwrap();
        assert_eq!(us.label, "LOC");
    }

    #[test]
    fn test_entity_with_connector() {
        let annotator = RuleAnnotator::new();
        let a = annotator
            .annotate("Le taux est fixé par la Banque de France chaque mois.")
            .unwrap();
        assert!(a.entities.iter().any(|e| e.text == "Banque de France"));
    }

    #[test]
    fn test_noun_phrase_with_postposed_adjective() {
        let annotator = RuleAnnotator::new();
        let a = annotator
            .annotate("Ce cours présente l'apprentissage automatique.")
            .unwrap();
        assert!(
            a.noun_phrases
                .iter()
                .any(|p| p == "apprentissage automatique"),
            "noun phrases: {:?}",
            a.noun_phrases
        );
    }

    #[test]
    fn test_noun_phrases_do_not_cross_sentences() {
        let annotator = RuleAnnotator::new();
        let a = annotator.annotate("un réseau.\nprotocole").unwrap();
        assert!(!a.noun_phrases.iter().any(|p| p.contains(' ')));
    }
}
