// Relevance scoring: how close is each candidate to the note as a whole?
//
// Both the candidate and the full note are embedded with the same model and
// compared by cosine similarity. Ties are broken alphabetically so the output
// never depends on hash or set iteration order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use super::embeddings::{cosine_similarity, EmbeddingProvider};
use super::error::{KeywordError, KeywordResult};

/// A candidate with its similarity to the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKeyword {
    pub keyword: String,
    pub score: f64,
}

/// Score every candidate against `document` and sort best-first.
///
/// Embeddings are fetched one at a time through the provider's cache.
pub async fn rank_candidates(
    provider: &mut EmbeddingProvider,
    document: &str,
    candidates: &BTreeSet<String>,
) -> KeywordResult<Vec<ScoredKeyword>> {
    if candidates.is_empty() {
        return Err(KeywordError::EmptyCandidates);
    }

    let document_embedding = provider.embed(document).await?;

    let mut scored = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let embedding = provider.embed(candidate).await?;
        scored.push(ScoredKeyword {
            keyword: candidate.clone(),
            score: cosine_similarity(&embedding, &document_embedding),
        });
    }

    sort_by_relevance(&mut scored);

    debug!(
        candidates = scored.len(),
        best = scored.first().map(|s| s.keyword.as_str()).unwrap_or(""),
        "Ranked candidates by relevance"
    );

    Ok(scored)
}

/// Descending score, then ascending keyword.
pub fn sort_by_relevance(scored: &mut [ScoredKeyword]) {
    scored.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.keyword.cmp(&b.keyword),
        other => other,
    });
}
