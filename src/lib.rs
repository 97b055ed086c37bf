//! # crosstopic
//!
//! A batch pipeline that connects two document collections through a shared
//! topic space. Documents are tokenized and normalized, folded into versioned
//! corpus generations, weighted with TF-IDF, modeled with LDA, and ranked
//! against each other by cosine similarity of their topic mixtures.
//!
//! ## Pipeline
//!
//! ```bash
//! # Build a generation per collection, sharing one vocabulary
//! crosstopic build --input-dir ./talks --name talks
//! crosstopic build --input-dir ./objects --name objects --vocab-from talks
//!
//! # Train the topic model on the index side
//! crosstopic train --generation objects --topics 150
//!
//! # Rank every object against one talk
//! crosstopic query --index objects --corpus talks \
//!     --metadata talks.tsv --object-id 41126 --limit 10
//! ```
//!
//! ## As a Library
//!
//! ```rust,no_run
//! use crosstopic::prelude::*;
//!
//! fn main() -> crosstopic::Result<()> {
//!     let tokenizer = Tokenizer::new(TokenizerConfig::default())?;
//!     let documents = vec![
//!         ("talk-1.txt".to_string(), "The steam engine changed industry".to_string()),
//!         ("talk-2.txt".to_string(), "Pottery and clay vessels of antiquity".to_string()),
//!     ];
//!     let outcome = build_corpus(&tokenizer, &documents, None, &BuildConfig::default());
//!
//!     let config = TrainingConfig { num_topics: 4, ..TrainingConfig::default() };
//!     let model = TopicModel::train(&outcome.corpus, outcome.vocabulary.len(), "demo", &config)?;
//!     let index = TopicIndex::build(&model, &outcome.corpus);
//!     let ranked = index.query(&model.dense_topics(&outcome.corpus[0]), Some(5));
//!     assert!(!ranked.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Structure
//!
//! crosstopic is composed of several crates:
//!
//! - [`crosstopic-core`](https://docs.rs/crosstopic-core) - Tokenizer, vocabulary, TF-IDF, LDA, similarity
//! - [`crosstopic-storage`](https://docs.rs/crosstopic-storage) - Generation artifacts and the data-directory store
//! - [`crosstopic-annotate`](https://docs.rs/crosstopic-annotate) - Knowledge-base annotation and corpus augmentation
//!
//! ## Features
//!
//! - **Versioned corpora**: named generations with reusable vocabularies
//! - **Reproducible training**: seeded Gibbs sampling, same seed same model
//! - **Cross-corpus queries**: rows resolved by name or external object id
//! - **Corpus augmentation**: entity annotation with abstract enrichment

// Re-export core types
pub use crosstopic_core::{
    build_corpus, cosine_similarity, ranked_tokens, BuildConfig, BuildOutcome, BuildReport,
    CorpusMap, Error, Lemmatizer, MetadataTable, MorphyLemmatizer, ObjectMetadata, PosTagger,
    Result, SimilarityMatch, SparseVector, TfIdfModel, Tokenizer, TokenizerConfig, TopicIndex,
    TopicModel, TrainingConfig, Vocabulary,
};

// Re-export storage
pub use crosstopic_storage::{CorpusGeneration, GenerationStore, Manifest};

// Re-export annotation
pub use crosstopic_annotate::{
    augment_generation, pick_annotation, AbstractFetcher, AbstractSource, Annotation,
    AnnotationParams, AnnotationSource, AugmentConfig, AugmentReport, MediaDownloader,
    SpotlightClient, DEFAULT_ENDPOINT,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        build_corpus, cosine_similarity, ranked_tokens, AnnotationParams, BuildConfig, BuildOutcome,
        CorpusGeneration, CorpusMap, Error, GenerationStore, MetadataTable, ObjectMetadata, Result,
        SimilarityMatch, SparseVector, SpotlightClient, TfIdfModel, Tokenizer, TokenizerConfig,
        TopicIndex, TopicModel, TrainingConfig, Vocabulary,
    };
}
