//! # crosstopic Core
//!
//! Core library for the crosstopic pipeline.
//!
//! This crate provides the text and modeling layers:
//!
//! - [`Tokenizer`] - Normalization ladder from raw text to token lists
//! - [`Vocabulary`] - First-appearance token ids with document frequencies
//! - [`TfIdfModel`] - Corpus weighting and low-weight pruning support
//! - [`TopicModel`] - Collapsed Gibbs LDA with seeded, reproducible training
//! - [`TopicIndex`] - Cosine ranking of documents in topic space
//!
//! ## Example
//!
//! ```rust
//! use crosstopic_core::{build_corpus, BuildConfig, Tokenizer, TokenizerConfig};
//!
//! # fn main() -> crosstopic_core::Result<()> {
//! let tokenizer = Tokenizer::new(TokenizerConfig::default())?;
//! let documents = vec![
//!     ("statue".to_string(), "A marble statue of a goddess".to_string()),
//!     ("coin".to_string(), "Silver coin depicting an emperor".to_string()),
//! ];
//! let outcome = build_corpus(&tokenizer, &documents, None, &BuildConfig::default());
//! assert_eq!(outcome.documents.len(), outcome.corpus.len());
//! # Ok(())
//! # }
//! ```

pub mod corpus;
pub mod error;
pub mod lemma;
pub mod mapping;
pub mod pipeline;
pub mod similarity;
pub mod text;
pub mod tfidf;
pub mod topics;
pub mod vocab;

pub use corpus::SparseVector;
pub use error::{Error, Result};
pub use lemma::{IdentityLemmatizer, Lemmatizer, MorphyLemmatizer, PartOfSpeech};
pub use mapping::{CorpusMap, MetadataTable, ObjectMetadata};
pub use pipeline::{build_corpus, BuildConfig, BuildOutcome, BuildReport, SkippedDocument};
pub use similarity::{cosine_similarity, SimilarityMatch, TopicIndex};
pub use text::{english_stopwords, PosTagger, Tokenizer, TokenizerConfig};
pub use tfidf::{ranked_tokens, TfIdfModel};
pub use topics::{TopicModel, TrainingConfig};
pub use vocab::Vocabulary;
