//! Token vocabulary with stable integer ids.
//!
//! Ids are assigned in order of first appearance across the corpus, so the
//! same document set always produces the same mapping. A rebuilt vocabulary
//! starts from zero again; ids are never comparable across builds.

use ahash::{AHashMap, AHashSet};

use crate::corpus::SparseVector;
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    token_ids: AHashMap<String, u32>,
    tokens: Vec<String>,
    dfs: Vec<u32>,
}

impl Vocabulary {
    /// Scans tokenized documents in order, assigning each distinct token the
    /// next free id and counting how many documents it appears in.
    #[must_use]
    pub fn build(documents: &[Vec<String>]) -> Self {
        let mut vocabulary = Self::default();
        for tokens in documents {
            let mut seen: AHashSet<u32> = AHashSet::new();
            for token in tokens {
                let id = match vocabulary.token_ids.get(token) {
                    Some(&id) => id,
                    None => {
                        let id = vocabulary.tokens.len() as u32;
                        vocabulary.token_ids.insert(token.clone(), id);
                        vocabulary.tokens.push(token.clone());
                        vocabulary.dfs.push(0);
                        id
                    }
                };
                if seen.insert(id) {
                    vocabulary.dfs[id as usize] += 1;
                }
            }
        }
        vocabulary
    }

    /// Reassembles a vocabulary from its persisted entries, position = id.
    pub fn from_parts(tokens: Vec<String>, dfs: Vec<u32>) -> Result<Self> {
        if tokens.len() != dfs.len() {
            return Err(Error::InvalidConfig(format!(
                "vocabulary has {} tokens but {} frequency entries",
                tokens.len(),
                dfs.len()
            )));
        }
        let mut token_ids = AHashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            if token_ids.insert(token.clone(), id as u32).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "duplicate vocabulary token: {token}"
                )));
            }
        }
        Ok(Self {
            token_ids,
            tokens,
            dfs,
        })
    }

    /// Counts known tokens into a bag-of-words vector. Tokens outside the
    /// vocabulary are dropped, never assigned fresh ids.
    #[must_use]
    pub fn doc_to_bow(&self, tokens: &[String]) -> SparseVector {
        SparseVector::from_counts(tokens.iter().filter_map(|t| self.id(t)))
    }

    #[must_use]
    pub fn id(&self, token: &str) -> Option<u32> {
        self.token_ids.get(token).copied()
    }

    #[must_use]
    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    #[must_use]
    pub fn df(&self, id: u32) -> Option<u32> {
        self.dfs.get(id as usize).copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All entries ascending by id, as (id, token, document frequency).
    pub fn entries(&self) -> impl Iterator<Item = (u32, &str, u32)> {
        self.tokens
            .iter()
            .zip(self.dfs.iter())
            .enumerate()
            .map(|(id, (token, &df))| (id as u32, token.as_str(), df))
    }
}
