// TF-IDF term weighting over a single note.
//
// With a one-document corpus the IDF factor is the same for every term, so
// the ranking is effectively raw term frequency after French stop-word
// removal. The relevance scorer does the final ranking.

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::debug;

use super::traits::TermWeighter;

/// Number of TF-IDF terms contributed to the candidate pool.
pub const TFIDF_TOP_TERMS: usize = 10;

/// TF-IDF weighter backed by the `keyword_extraction` crate.
pub struct TfIdfWeighter {
    stop_words: Vec<String>,
}

impl Default for TfIdfWeighter {
    fn default() -> Self {
        Self {
            stop_words: get(LANGUAGE::French),
        }
    }
}

impl TermWeighter for TfIdfWeighter {
    fn top_terms(&self, text: &str, k: usize) -> Result<Vec<String>> {
        let documents = [text.to_string()];
        let params = TfIdfParams::UnprocessedDocuments(&documents, &self.stop_words, None);
        let tfidf = TfIdf::new(params);

        let ranked: Vec<(String, f32)> = tfidf.get_ranked_word_scores(k);

        if ranked.is_empty() {
            anyhow::bail!("TF-IDF vocabulary is empty after stop-word removal");
        }

        debug!(
            terms = ranked.len(),
            top_term = ranked[0].0.as_str(),
            top_score = ranked[0].1,
            "Ranked TF-IDF terms"
        );

        Ok(ranked.into_iter().map(|(word, _)| word).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_terms_include_content_words() {
        let weighter = TfIdfWeighter::default();
        let text = "Le routeur transmet les paquets. Le routeur choisit la route. \
                    Chaque routeur maintient une table de routage.";
        let terms = weighter.top_terms(text, TFIDF_TOP_TERMS).unwrap();
        assert!(terms.len() <= TFIDF_TOP_TERMS);
        assert!(terms.contains(&"routeur".to_string()), "terms: {terms:?}");
        assert!(!terms.contains(&"le".to_string()));
    }

    #[test]
    fn test_only_stop_words_fails() {
        let weighter = TfIdfWeighter::default();
        let result = weighter.top_terms("le la les et de", TFIDF_TOP_TERMS);
        assert!(result.is_err());
    }
}
