//! TF-IDF weighting over a bag-of-words corpus.
//!
//! Inverse document frequency is `log2(N / df)`, so tokens present in every
//! document weigh zero and vanish from transformed vectors. Transformed
//! vectors are L2-normalized.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::corpus::SparseVector;
use crate::vocab::Vocabulary;

/// Products at or below this are treated as zero and dropped.
const WEIGHT_EPSILON: f64 = 1e-12;

/// Document-frequency statistics fitted from one corpus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TfIdfModel {
    num_docs: u32,
    dfs: HashMap<u32, u32>,
}

impl TfIdfModel {
    /// Counts, per token id, how many corpus rows carry it.
    #[must_use]
    pub fn fit(corpus: &[SparseVector]) -> Self {
        let mut dfs: HashMap<u32, u32> = HashMap::new();
        for vector in corpus {
            for &(id, _) in vector.entries() {
                *dfs.entry(id).or_insert(0) += 1;
            }
        }
        Self {
            num_docs: corpus.len() as u32,
            dfs,
        }
    }

    #[inline]
    #[must_use]
    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    /// Ids the model has statistics for.
    pub fn known_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.dfs.keys().copied()
    }

    #[must_use]
    pub fn idf(&self, id: u32) -> f64 {
        match self.dfs.get(&id) {
            Some(&df) if df > 0 => (f64::from(self.num_docs) / f64::from(df)).log2(),
            _ => 0.0,
        }
    }

    /// Reweights a count vector by idf and L2-normalizes it. Zero-weight
    /// entries are dropped, so ubiquitous tokens simply disappear.
    #[must_use]
    pub fn transform(&self, vector: &SparseVector) -> SparseVector {
        let mut entries: Vec<(u32, f64)> = vector
            .entries()
            .iter()
            .filter_map(|&(id, tf)| {
                let weight = tf * self.idf(id);
                if weight.abs() <= WEIGHT_EPSILON {
                    None
                } else {
                    Some((id, weight))
                }
            })
            .collect();
        let norm = entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }
        SparseVector::from_entries(entries)
    }

    #[must_use]
    pub fn transform_corpus(&self, corpus: &[SparseVector]) -> Vec<SparseVector> {
        corpus.iter().map(|v| self.transform(v)).collect()
    }
}

/// Token strings of a weighted vector, heaviest first.
#[must_use]
pub fn ranked_tokens(vocabulary: &Vocabulary, vector: &SparseVector) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = vector
        .entries()
        .iter()
        .filter_map(|&(id, weight)| vocabulary.token(id).map(|t| (t.to_string(), weight)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<SparseVector> {
        vec![
            SparseVector::from_entries(vec![(0, 2.0), (1, 1.0)]),
            SparseVector::from_entries(vec![(0, 1.0), (2, 3.0)]),
        ]
    }

    #[test]
    fn idf_is_log2_of_inverse_document_fraction() {
        let model = TfIdfModel::fit(&corpus());
        assert_eq!(model.idf(0), 0.0);
        assert_eq!(model.idf(1), 1.0);
        assert_eq!(model.idf(2), 1.0);
    }

    #[test]
    fn unknown_ids_weigh_zero() {
        let model = TfIdfModel::fit(&corpus());
        assert_eq!(model.idf(99), 0.0);
    }

    #[test]
    fn ubiquitous_tokens_vanish_from_transformed_vectors() {
        let model = TfIdfModel::fit(&corpus());
        let transformed = model.transform(&SparseVector::from_entries(vec![(0, 5.0), (1, 1.0)]));
        assert_eq!(transformed.len(), 1);
        assert_eq!(transformed.entries()[0].0, 1);
    }

    #[test]
    fn transformed_vectors_are_unit_length() {
        let model = TfIdfModel::fit(&corpus());
        let transformed = model.transform(&SparseVector::from_entries(vec![(1, 2.0), (2, 1.0)]));
        assert!((transformed.l2_norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_vector_transforms_to_empty() {
        let model = TfIdfModel::fit(&corpus());
        let transformed = model.transform(&SparseVector::from_entries(vec![(0, 4.0)]));
        assert!(transformed.is_empty());
    }

    #[test]
    fn ranked_tokens_order_heaviest_first() {
        let vocabulary = Vocabulary::build(&[vec!["alpha".to_string(), "beta".to_string()]]);
        let vector = SparseVector::from_entries(vec![(0, 0.2), (1, 0.8)]);
        let ranked = ranked_tokens(&vocabulary, &vector);
        assert_eq!(ranked[0].0, "beta");
        assert_eq!(ranked[1].0, "alpha");
    }
}
