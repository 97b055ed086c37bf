//! Corpus construction.
//!
//! A build tokenizes raw documents in parallel, drops documents that
//! normalize to nothing, assembles the vocabulary, and weights the result.
//! When a weight floor is set, tokens scoring under it are pruned from their
//! documents and the corpus is vectorized a second time; a fresh build also
//! rebuilds the vocabulary so pruned tokens release their ids. Documents
//! emptied by pruning keep their rows.

use ahash::AHashSet;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::corpus::SparseVector;
use crate::text::Tokenizer;
use crate::tfidf::TfIdfModel;
use crate::vocab::Vocabulary;

/// Corpus build settings.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Fit TF-IDF over the corpus and keep the model alongside it.
    pub apply_tfidf: bool,
    /// Prune tokens whose weight falls below this in their document. Zero
    /// disables pruning.
    pub min_weight: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            apply_tfidf: true,
            min_weight: 0.05,
        }
    }
}

/// Per-document account of a build.
#[derive(Clone, Debug, Default)]
pub struct BuildReport {
    pub total: usize,
    pub kept: usize,
    pub skipped: Vec<SkippedDocument>,
}

#[derive(Clone, Debug)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

/// Everything a build produces. `documents` and `corpus` are row-aligned.
pub struct BuildOutcome {
    pub vocabulary: Vocabulary,
    pub documents: Vec<String>,
    pub corpus: Vec<SparseVector>,
    pub tfidf: Option<TfIdfModel>,
    pub report: BuildReport,
}

/// Builds a corpus over `documents` as (name, text) pairs.
///
/// With `existing`, the supplied vocabulary is reused as-is: unknown tokens
/// are dropped and no ids are assigned, which keeps the rows comparable to
/// the corpus the vocabulary came from. Without it, ids are assigned fresh.
#[must_use]
pub fn build_corpus(
    tokenizer: &Tokenizer,
    documents: &[(String, String)],
    existing: Option<&Vocabulary>,
    config: &BuildConfig,
) -> BuildOutcome {
    let tokenized: Vec<Vec<String>> = documents
        .par_iter()
        .map(|(_, text)| tokenizer.tokenize(text))
        .collect();

    let mut report = BuildReport {
        total: documents.len(),
        ..BuildReport::default()
    };
    let mut names: Vec<String> = Vec::new();
    let mut docs: Vec<Vec<String>> = Vec::new();
    for ((name, _), tokens) in documents.iter().zip(tokenized) {
        if tokens.is_empty() {
            warn!(document = %name, "skipping document: no usable tokens");
            report.skipped.push(SkippedDocument {
                name: name.clone(),
                reason: "no usable tokens after normalization".to_string(),
            });
            continue;
        }
        names.push(name.clone());
        docs.push(tokens);
    }
    report.kept = names.len();

    let mut vocabulary = match existing {
        Some(v) => v.clone(),
        None => Vocabulary::build(&docs),
    };
    let mut corpus: Vec<SparseVector> = docs.iter().map(|d| vocabulary.doc_to_bow(d)).collect();

    let tfidf = if config.apply_tfidf {
        let mut model = TfIdfModel::fit(&corpus);
        if config.min_weight > 0.0 {
            let pruned = prune_documents(&mut docs, &vocabulary, &model, &corpus, config.min_weight);
            if pruned > 0 {
                info!(tokens = pruned, "pruned low-weight token occurrences");
                if existing.is_none() {
                    vocabulary = Vocabulary::build(&docs);
                }
                corpus = docs.iter().map(|d| vocabulary.doc_to_bow(d)).collect();
                model = TfIdfModel::fit(&corpus);
            }
        }
        Some(model)
    } else {
        None
    };

    info!(
        total = report.total,
        kept = report.kept,
        vocabulary = vocabulary.len(),
        "corpus built"
    );

    BuildOutcome {
        vocabulary,
        documents: names,
        corpus,
        tfidf,
        report,
    }
}

/// Removes from each document the tokens whose TF-IDF weight in that
/// document falls below `min_weight`. Tokens missing from the weighted
/// vector, including those zeroed by an idf of 0, are untouched. Returns the
/// number of occurrences removed.
fn prune_documents(
    docs: &mut [Vec<String>],
    vocabulary: &Vocabulary,
    model: &TfIdfModel,
    corpus: &[SparseVector],
    min_weight: f64,
) -> usize {
    let mut removed = 0;
    for (tokens, bow) in docs.iter_mut().zip(corpus) {
        let weighted = model.transform(bow);
        let low: AHashSet<u32> = weighted
            .entries()
            .iter()
            .filter(|&&(_, w)| w < min_weight)
            .map(|&(id, _)| id)
            .collect();
        if low.is_empty() {
            continue;
        }
        let before = tokens.len();
        tokens.retain(|t| match vocabulary.id(t) {
            Some(id) => !low.contains(&id),
            None => true,
        });
        removed += before - tokens.len();
    }
    removed
}
