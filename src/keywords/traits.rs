// Capability traits for the collaborators the keyword engine depends on.
//
// Each external service sits behind a narrow trait so the engine can be
// driven by deterministic fakes in tests and the backends can be swapped
// (another embedding server, a real dependency parser) without touching
// the ranking or alignment code.

use anyhow::Result;
use async_trait::async_trait;

/// Turns text into a dense vector. Implementations must be async because
/// the default backend is an HTTP service.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// Coarse part-of-speech classes, as far as candidate generation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosTag {
    Noun,
    ProperNoun,
    Adjective,
    Verb,
    Adverb,
    /// Determiners, pronouns, prepositions, conjunctions, auxiliaries.
    Function,
    Number,
    Punctuation,
}

impl PosTag {
    pub fn is_noun(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::ProperNoun)
    }

    /// Tags whose single tokens are kept as keyword candidates.
    pub fn is_content(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::ProperNoun | PosTag::Adjective)
    }
}

/// A single token with its surface text and tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedToken {
    pub text: String,
    pub pos: PosTag,
    pub sentence_idx: usize,
}

/// A named-entity span.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpan {
    pub text: String,
    /// Entity class in the annotator's own taxonomy (e.g. "PER", "LOC", "MISC").
    pub label: String,
}

/// Everything candidate generation needs from a linguistic pass.
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    pub entities: Vec<EntitySpan>,
    pub noun_phrases: Vec<String>,
    pub tokens: Vec<TaggedToken>,
}

/// Linguistic annotator for one natural language.
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Annotation>;
}

/// Statistical term weighting over a (here, single-document) corpus.
///
/// May fail on degenerate input such as an empty vocabulary after stop-word
/// removal; callers treat that as "no terms".
pub trait TermWeighter: Send + Sync {
    fn top_terms(&self, text: &str, k: usize) -> Result<Vec<String>>;
}
