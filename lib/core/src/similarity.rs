//! Topic-space similarity queries.
//!
//! The index is derived from a model and a corpus at query time and lives
//! only in memory; it is never persisted.

use serde::{Deserialize, Serialize};

use crate::corpus::SparseVector;
use crate::topics::TopicModel;

/// Cosine similarity between two dense vectors. Mismatched dimensions and
/// zero-norm inputs score 0.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Dense topic mixtures for every row of a corpus, in row order.
pub struct TopicIndex {
    num_topics: usize,
    rows: Vec<Vec<f64>>,
}

impl TopicIndex {
    /// Projects each corpus row through the model.
    #[must_use]
    pub fn build(model: &TopicModel, corpus: &[SparseVector]) -> Self {
        Self {
            num_topics: model.num_topics(),
            rows: corpus.iter().map(|v| model.dense_topics(v)).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Scores `query` against every row, best first. `None` returns the full
    /// ranking.
    #[must_use]
    pub fn query(&self, query: &[f64], limit: Option<usize>) -> Vec<(usize, f64)> {
        let mut results: Vec<(usize, f64)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, topics)| (row, cosine_similarity(query, topics)))
            .collect();
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        results
    }
}

/// One ranked hit of a cross-corpus query, carrying enough identity to trace
/// both sides back to their corpora.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub score: f64,
    pub index_doc: String,
    pub query_doc: String,
    pub query_object_id: String,
    pub index_row: usize,
    pub query_row: usize,
    pub media_id: String,
}
