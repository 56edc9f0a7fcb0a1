// KeywordExtractor: the public face of the keyword engine.
//
// Owns the injected collaborators (embedder, annotator, term weighter) and the
// two instance-scoped caches. Dropping the extractor, or calling `clear()`,
// is the only way to forget cached embeddings and alignments.

use tracing::{debug, info};

use super::alignment::{self, AlignmentCache};
use super::annotator::RuleAnnotator;
use super::candidates::generate_candidates;
use super::embeddings::EmbeddingProvider;
use super::error::KeywordResult;
use super::relevance::rank_candidates;
use super::tfidf::TfIdfWeighter;
use super::traits::{Annotator, Embedder, TermWeighter};

pub struct KeywordExtractor {
    embeddings: EmbeddingProvider,
    alignments: AlignmentCache,
    annotator: Box<dyn Annotator>,
    weighter: Box<dyn TermWeighter>,
}

impl KeywordExtractor {
    pub fn new(
        embedder: Box<dyn Embedder>,
        annotator: Box<dyn Annotator>,
        weighter: Box<dyn TermWeighter>,
    ) -> Self {
        Self {
            embeddings: EmbeddingProvider::new(embedder),
            alignments: AlignmentCache::new(),
            annotator,
            weighter,
        }
    }

    /// Extractor with the built-in French annotator and TF-IDF weighter.
    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        Self::new(
            embedder,
            Box::new(RuleAnnotator::new()),
            Box::new(TfIdfWeighter::default()),
        )
    }

    /// Up to `num_keywords` keywords for `text`, most relevant first.
    ///
    /// An empty result means no candidate survived filtering. It is not an
    /// error. The extractor applies no length guard; callers decide which
    /// documents are worth processing.
    pub async fn extract_keywords(
        &mut self,
        text: &str,
        num_keywords: usize,
    ) -> KeywordResult<Vec<String>> {
        let candidates =
            generate_candidates(text, self.annotator.as_ref(), self.weighter.as_ref())?;

        if candidates.is_empty() {
            info!("No keyword candidates found");
            return Ok(Vec::new());
        }

        let ranked = rank_candidates(&mut self.embeddings, text, &candidates).await?;

        let keywords: Vec<String> = ranked
            .into_iter()
            .take(num_keywords)
            .map(|s| s.keyword)
            .collect();

        debug!(
            candidates = candidates.len(),
            keywords = ?keywords,
            "Extracted keywords"
        );

        Ok(keywords)
    }

    /// Collapse near-duplicate keywords into cluster representatives.
    /// See `alignment::align` for the exact semantics.
    pub async fn align_keywords(
        &mut self,
        keywords: &[String],
        threshold: f64,
    ) -> KeywordResult<Vec<String>> {
        alignment::align(&mut self.embeddings, &mut self.alignments, keywords, threshold).await
    }

    /// Current representative for `keyword`, if it has been aligned.
    pub fn representative_of(&self, keyword: &str) -> Option<&str> {
        self.alignments.get(keyword)
    }

    pub fn embedding_cache_len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn alignment_cache_len(&self) -> usize {
        self.alignments.len()
    }

    /// Forget every cached embedding and alignment.
    pub fn clear(&mut self) {
        self.embeddings.clear();
        self.alignments.clear();
    }
}
