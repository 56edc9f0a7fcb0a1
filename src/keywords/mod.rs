// Keyword extraction and alignment: the engine that feeds suggested keywords
// to the question generator and collapses keyword variants across notes.
//
// Leaf-first: embeddings (provider + cache) → candidates (annotator + TF-IDF)
// → relevance ranking → alignment clustering. The extractor ties them together.

pub mod alignment;
pub mod annotator;
pub mod candidates;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod relevance;
pub mod tfidf;
pub mod traits;

pub use error::KeywordError;
pub use extractor::KeywordExtractor;
