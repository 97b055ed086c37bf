//! Bag-of-words corpus representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A document as sparse (token id, weight) entries, unique and ascending by
/// id. Raw counts and TF-IDF weights share this shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vector from arbitrary-order entries. Ids must be unique.
    #[must_use]
    pub fn from_entries(mut entries: Vec<(u32, f64)>) -> Self {
        entries.sort_by_key(|&(id, _)| id);
        Self { entries }
    }

    /// Counts id occurrences into a sorted vector.
    #[must_use]
    pub fn from_counts(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut counts: BTreeMap<u32, f64> = BTreeMap::new();
        for id in ids {
            *counts.entry(id).or_insert(0.0) += 1.0;
        }
        Self {
            entries: counts.into_iter().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Weight stored under `id`, if present.
    #[must_use]
    pub fn weight(&self, id: u32) -> Option<f64> {
        self.entries
            .binary_search_by_key(&id, |&(entry_id, _)| entry_id)
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    #[must_use]
    pub fn l2_norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, w)| w * w)
            .sum::<f64>()
            .sqrt()
    }
}
