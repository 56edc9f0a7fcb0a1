// Keyword alignment: collapse spelling and phrasing variants into one label.
//
// Greedy, seed-anchored clustering over a cosine similarity matrix. Each
// unassigned keyword (in first-appearance order) seeds a cluster and pulls in
// every other keyword whose similarity *to the seed* reaches the threshold.
// Membership is not transitive: a keyword close to a member but not to the
// seed stays out. A keyword already placed in an earlier cluster can still
// join a later seed's cluster; the later alignment wins in the cache.
//
// The representative of a cluster is its most frequent member in the input,
// ties going to the member that appeared first.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::embeddings::{cosine_similarity, EmbeddingProvider};
use super::error::{KeywordError, KeywordResult};

/// Default similarity threshold for treating two keywords as the same concept.
pub const DEFAULT_ALIGN_THRESHOLD: f64 = 0.85;

/// Keyword → representative mapping, kept for the lifetime of an extractor.
#[derive(Debug, Default, Clone)]
pub struct AlignmentCache {
    map: HashMap<String, String>,
}

impl AlignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.map.get(keyword).map(String::as_str)
    }

    pub fn insert(&mut self, keyword: &str, representative: &str) {
        self.map
            .insert(keyword.to_string(), representative.to_string());
    }

    /// Cached representatives for every keyword, or `None` if any is missing.
    pub fn lookup_all(&self, keywords: &[String]) -> Option<Vec<String>> {
        keywords
            .iter()
            .map(|k| self.map.get(k).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Symmetric pairwise cosine similarities over a list of vectors.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build the full matrix. Fails if the vectors do not share one dimension.
    pub fn from_embeddings<V: AsRef<[f64]>>(embeddings: &[V]) -> KeywordResult<Self> {
        let n = embeddings.len();
        if let Some(first) = embeddings.first() {
            let expected = first.as_ref().len();
            if let Some(bad) = embeddings.iter().find(|e| e.as_ref().len() != expected) {
                return Err(KeywordError::DimensionMismatch {
                    expected,
                    actual: bad.as_ref().len(),
                });
            }
        }

        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = cosine_similarity(embeddings[i].as_ref(), embeddings[j].as_ref());
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        Ok(Self { n, values })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}

/// Seed-anchored greedy clustering. Returns clusters as index lists into the
/// matrix, seed first, in creation order.
pub fn cluster_by_similarity(matrix: &SimilarityMatrix, threshold: f64) -> Vec<Vec<usize>> {
    let n = matrix.len();
    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for seed in 0..n {
        if assigned[seed] {
            continue;
        }

        assigned[seed] = true;
        let mut members = vec![seed];

        for other in 0..n {
            if other != seed && matrix.get(seed, other) >= threshold {
                assigned[other] = true;
                members.push(other);
            }
        }

        clusters.push(members);
    }

    clusters
}

/// Most frequent member of `cluster` in `keywords`; ties go to the member
/// that occurs first in `keywords`.
pub fn pick_representative<'a>(cluster: &[&'a str], keywords: &[String]) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize, usize)> = None;

    for &member in cluster {
        let count = keywords.iter().filter(|k| k.as_str() == member).count();
        let first_seen = keywords
            .iter()
            .position(|k| k.as_str() == member)
            .unwrap_or(usize::MAX);

        let better = match best {
            None => true,
            Some((_, best_count, best_seen)) => {
                count > best_count || (count == best_count && first_seen < best_seen)
            }
        };
        if better {
            best = Some((member, count, first_seen));
        }
    }

    best.map(|(member, _, _)| member)
}

/// Align `keywords` against each other and update `cache`.
///
/// Returns one representative per cluster, in cluster-creation order. When
/// every keyword is already cached, returns the distinct cached
/// representatives in input order without embedding anything.
///
/// Any threshold except NaN is accepted: above 1.0 nothing merges, below
/// -1.0 everything joins the first seed.
pub async fn align(
    provider: &mut EmbeddingProvider,
    cache: &mut AlignmentCache,
    keywords: &[String],
    threshold: f64,
) -> KeywordResult<Vec<String>> {
    if keywords.is_empty() {
        return Ok(Vec::new());
    }
    if threshold.is_nan() {
        return Err(KeywordError::InvalidThreshold(threshold));
    }

    if let Some(cached) = cache.lookup_all(keywords) {
        debug!(keywords = keywords.len(), "Alignment served from cache");
        return Ok(distinct_in_order(cached));
    }

    // Distinct keywords in first-appearance order.
    let mut distinct: Vec<&str> = Vec::new();
    for k in keywords {
        if !distinct.contains(&k.as_str()) {
            distinct.push(k.as_str());
        }
    }

    let mut embeddings = Vec::with_capacity(distinct.len());
    for k in &distinct {
        embeddings.push(provider.embed(k).await?);
    }

    let matrix = SimilarityMatrix::from_embeddings(&embeddings)?;
    let clusters = cluster_by_similarity(&matrix, threshold);

    let mut representatives = Vec::with_capacity(clusters.len());
    for indices in &clusters {
        let members: Vec<&str> = indices.iter().map(|&i| distinct[i]).collect();
        let Some(representative) = pick_representative(&members, keywords) else {
            continue;
        };

        for member in &members {
            cache.insert(member, representative);
        }
        representatives.push(representative.to_string());
    }

    debug!(
        keywords = keywords.len(),
        distinct = distinct.len(),
        clusters = representatives.len(),
        threshold,
        "Aligned keywords"
    );

    Ok(representatives)
}

fn distinct_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let m = SimilarityMatrix::from_embeddings(&[
            vec![1.0, 0.0],
            vec![0.6, 0.8],
            vec![0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(m.len(), 3);
        for i in 0..3 {
            assert!((m.get(i, i) - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert!((m.get(i, j) - m.get(j, i)).abs() < 1e-12);
            }
        }
        assert!((m.get(0, 1) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_rejects_ragged_input() {
        let err = SimilarityMatrix::from_embeddings(&[vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            KeywordError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    /// a~b = 0.9, b~c = 0.9, a~c = 0.62: c is close to b but not to the seed a.
    fn chain_matrix() -> SimilarityMatrix {
        let a = vec![1.0, 0.0];
        let b = vec![0.9, (1.0f64 - 0.81).sqrt()];
        let angle = 2.0 * 0.9f64.acos();
        let c = vec![angle.cos(), angle.sin()];
        SimilarityMatrix::from_embeddings(&[a, b, c]).unwrap()
    }

    #[test]
    fn test_clustering_is_seed_anchored_not_transitive() {
        let clusters = cluster_by_similarity(&chain_matrix(), 0.85);
        // c is not pulled into a's cluster through b; it seeds its own,
        // and b (already assigned) joins it as well.
        assert_eq!(clusters, vec![vec![0, 1], vec![2, 1]]);
    }

    #[test]
    fn test_low_threshold_merges_everything_into_first_seed() {
        let clusters = cluster_by_similarity(&chain_matrix(), 0.5);
        assert_eq!(clusters, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_representative_most_frequent() {
        let keywords = strings(&["chats", "chat", "chat"]);
        assert_eq!(
            pick_representative(&["chats", "chat"], &keywords),
            Some("chat")
        );
    }

    #[test]
    fn test_representative_tie_goes_to_first_seen() {
        let keywords = strings(&["chats", "chat"]);
        assert_eq!(
            pick_representative(&["chat", "chats"], &keywords),
            Some("chats")
        );
    }

    #[test]
    fn test_representative_of_empty_cluster() {
        assert_eq!(pick_representative(&[], &strings(&["a"])), None);
    }

    #[test]
    fn test_cache_lookup_all_requires_every_key() {
        let mut cache = AlignmentCache::new();
        cache.insert("chats", "chat");
        assert_eq!(
            cache.lookup_all(&strings(&["chats"])),
            Some(strings(&["chat"]))
        );
        assert_eq!(cache.lookup_all(&strings(&["chats", "chien"])), None);
    }

    #[test]
    fn test_distinct_in_order() {
        assert_eq!(
            distinct_in_order(strings(&["chat", "chien", "chat"])),
            strings(&["chat", "chien"])
        );
    }
}
