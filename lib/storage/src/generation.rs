//! A corpus generation: the immutable artifact set produced by one build.

use chrono::{DateTime, Utc};
use crosstopic_core::{Error, Result, SparseVector, TfIdfModel, Vocabulary};
use serde::{Deserialize, Serialize};

/// Build summary persisted as `manifest.json` next to the other artifacts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub built_at: DateTime<Utc>,
    pub documents: usize,
    pub vocabulary: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reused_vocabulary_from: Option<String>,
}

/// One named corpus build: document names aligned with vector rows, the
/// vocabulary that gives token ids meaning, and the fitted weighting model.
///
/// Construction validates the alignment invariants, so a loaded generation
/// is safe to index by row.
#[derive(Debug)]
pub struct CorpusGeneration {
    name: String,
    built_at: DateTime<Utc>,
    vocabulary: Vocabulary,
    documents: Vec<String>,
    corpus: Vec<SparseVector>,
    tfidf: Option<TfIdfModel>,
    reused_vocabulary_from: Option<String>,
}

impl CorpusGeneration {
    /// Assembles a fresh generation, stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        vocabulary: Vocabulary,
        documents: Vec<String>,
        corpus: Vec<SparseVector>,
        tfidf: Option<TfIdfModel>,
        reused_vocabulary_from: Option<String>,
    ) -> Result<Self> {
        Self::restore(
            name.into(),
            Utc::now(),
            vocabulary,
            documents,
            corpus,
            tfidf,
            reused_vocabulary_from,
        )
    }

    /// Reassembles a generation from persisted parts, re-running the same
    /// validation as a fresh build.
    pub(crate) fn restore(
        name: String,
        built_at: DateTime<Utc>,
        vocabulary: Vocabulary,
        documents: Vec<String>,
        corpus: Vec<SparseVector>,
        tfidf: Option<TfIdfModel>,
        reused_vocabulary_from: Option<String>,
    ) -> Result<Self> {
        if documents.len() != corpus.len() {
            return Err(Error::CorpusMisaligned {
                documents: documents.len(),
                rows: corpus.len(),
            });
        }
        let vocab_len = vocabulary.len();
        for vector in &corpus {
            for &(id, _) in vector.entries() {
                if id as usize >= vocab_len {
                    return Err(Error::TokenIdOutOfRange {
                        id,
                        vocabulary: vocab_len,
                    });
                }
            }
        }
        if let Some(model) = &tfidf {
            for id in model.known_ids() {
                if id as usize >= vocab_len {
                    return Err(Error::TokenIdOutOfRange {
                        id,
                        vocabulary: vocab_len,
                    });
                }
            }
        }
        Ok(Self {
            name,
            built_at,
            vocabulary,
            documents,
            corpus,
            tfidf,
            reused_vocabulary_from,
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    #[inline]
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[inline]
    #[must_use]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    #[inline]
    #[must_use]
    pub fn corpus(&self) -> &[SparseVector] {
        &self.corpus
    }

    #[inline]
    #[must_use]
    pub fn tfidf(&self) -> Option<&TfIdfModel> {
        self.tfidf.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn reused_vocabulary_from(&self) -> Option<&str> {
        self.reused_vocabulary_from.as_deref()
    }

    /// Number of corpus rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document_name(&self, row: usize) -> Result<&str> {
        self.documents
            .get(row)
            .map(String::as_str)
            .ok_or(Error::RowOutOfRange {
                row,
                rows: self.documents.len(),
            })
    }

    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest {
            name: self.name.clone(),
            built_at: self.built_at,
            documents: self.documents.len(),
            vocabulary: self.vocabulary.len(),
            reused_vocabulary_from: self.reused_vocabulary_from.clone(),
        }
    }
}
