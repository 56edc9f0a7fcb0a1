// Text embeddings via an Ollama server, plus the per-extractor embedding cache.
//
// Keywords and documents are embedded with the same model so cosine similarity
// between a candidate and its note (or between two keyword variants) measures
// semantic proximity: "apprentissage automatique" lands near "machine learning"
// even though they share no characters.
//
// The cache lives for the lifetime of one KeywordExtractor. It has no size
// bound: one run processes a bounded folder of notes. A long-running service
// should put an LRU in front of it instead.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{KeywordError, KeywordResult};
use super::traits::Embedder;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Embedding model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Embedder backed by Ollama's `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to call Ollama embeddings at {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama embeddings returned {}: {}", status, body);
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse Ollama embeddings response")?;

        Ok(result.embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

/// Caching wrapper around an `Embedder`.
///
/// Every vector is validated once on the way in: non-empty, all finite, and
/// the same length as the first vector this provider ever accepted. After
/// that, lookups for the same text return the same `Arc` without touching
/// the backend.
pub struct EmbeddingProvider {
    embedder: Box<dyn Embedder>,
    cache: HashMap<String, Arc<[f64]>>,
    dimension: Option<usize>,
}

impl EmbeddingProvider {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            cache: HashMap::new(),
            dimension: None,
        }
    }

    /// Return the embedding for `text`, calling the backend only on a miss.
    pub async fn embed(&mut self, text: &str) -> KeywordResult<Arc<[f64]>> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(Arc::clone(hit));
        }

        let raw = self
            .embedder
            .embed(text)
            .await
            .map_err(|source| KeywordError::EmbeddingService {
                text: text.to_string(),
                source,
            })?;

        self.validate(text, &raw)?;

        let vector: Arc<[f64]> = raw.into();
        self.dimension.get_or_insert(vector.len());
        self.cache.insert(text.to_string(), Arc::clone(&vector));

        debug!(
            dim = vector.len(),
            cached = self.cache.len(),
            "Embedded text"
        );

        Ok(vector)
    }

    fn validate(&self, text: &str, vector: &[f64]) -> KeywordResult<()> {
        if vector.is_empty() {
            return Err(KeywordError::MalformedEmbedding {
                text: text.to_string(),
                reason: "empty vector".to_string(),
            });
        }
        if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
            return Err(KeywordError::MalformedEmbedding {
                text: text.to_string(),
                reason: format!("non-finite value at index {pos}"),
            });
        }
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(KeywordError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }

    /// Whether `text` has already been embedded.
    pub fn contains(&self, text: &str) -> bool {
        self.cache.contains_key(text)
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Dimension fixed by the first accepted vector, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Drop every cached vector and forget the established dimension.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.dimension = None;
    }
}

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Returns 0.0 for empty or mismatched inputs and for zero-magnitude vectors,
/// so a degenerate embedding never ranks above a real one by accident.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}
