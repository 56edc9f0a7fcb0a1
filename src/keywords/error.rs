// Typed errors for the keyword engine.
//
// Service failures and malformed input are kept apart so callers can decide
// what is worth retrying. "No keywords found" is not an error: it is an empty
// result from `extract_keywords`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeywordError {
    /// The embedding backend could not be reached or returned an error status.
    #[error("embedding service failed for {text:?}: {source}")]
    EmbeddingService {
        text: String,
        #[source]
        source: anyhow::Error,
    },

    /// The backend answered, but the vector is unusable (empty or non-finite).
    #[error("malformed embedding for {text:?}: {reason}")]
    MalformedEmbedding { text: String, reason: String },

    /// A vector's length differs from the dimension already established.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Relevance scoring was asked to rank nothing.
    #[error("cannot rank an empty candidate set")]
    EmptyCandidates,

    #[error("similarity threshold must be a number, got {0}")]
    InvalidThreshold(f64),

    /// The linguistic annotator failed on the document.
    #[error("linguistic annotation failed: {0}")]
    Annotation(#[source] anyhow::Error),
}

pub type KeywordResult<T> = std::result::Result<T, KeywordError>;
