//! Named generations under a data directory.

use crate::artifacts;
use crate::generation::{CorpusGeneration, Manifest};
use crosstopic_core::{Error, Result, TopicModel};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DOCUMENTS_FILE: &str = "documents.docsid";
pub const VOCABULARY_FILE: &str = "vocabulary.dict";
pub const MATRIX_FILE: &str = "corpus.mm";
pub const TFIDF_FILE: &str = "model.tfidf";
pub const TOPICS_FILE: &str = "topics.lda";
pub const AUGMENTATION_FILE: &str = "augmentation.tsv";
pub const AUGMENT_DIR: &str = "augment";

/// Persists and loads corpus generations, each in its own subdirectory of
/// the data directory. Loaded generations are cached and shared.
pub struct GenerationStore {
    data_dir: PathBuf,
    generations: RwLock<HashMap<String, Arc<CorpusGeneration>>>,
}

impl GenerationStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            generations: RwLock::new(HashMap::new()),
        })
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[inline]
    #[must_use]
    pub fn generation_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    #[inline]
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.generation_dir(name).join(MANIFEST_FILE).exists()
    }

    /// Writes every artifact of a generation and caches it.
    pub fn save(&self, generation: CorpusGeneration) -> Result<Arc<CorpusGeneration>> {
        let dir = self.generation_dir(generation.name());
        std::fs::create_dir_all(&dir)?;

        let manifest = serde_json::to_vec_pretty(&generation.manifest())
            .map_err(|e| Error::Serialization(e.to_string()))?;
        artifacts::write_atomic(&dir.join(MANIFEST_FILE), &manifest)?;
        artifacts::write_document_names(&dir.join(DOCUMENTS_FILE), generation.documents())?;
        artifacts::write_vocabulary(&dir.join(VOCABULARY_FILE), generation.vocabulary())?;
        artifacts::write_matrix(
            &dir.join(MATRIX_FILE),
            generation.corpus(),
            generation.vocabulary().len(),
        )?;
        if let Some(model) = generation.tfidf() {
            artifacts::save_bincode(&dir.join(TFIDF_FILE), model)?;
        }

        info!(
            generation = generation.name(),
            documents = generation.len(),
            vocabulary = generation.vocabulary().len(),
            "generation saved"
        );
        let shared = Arc::new(generation);
        self.generations
            .write()
            .insert(shared.name().to_string(), shared.clone());
        Ok(shared)
    }

    /// Loads a generation, re-validating alignment and id bounds. The
    /// directory name is authoritative when the manifest disagrees.
    pub fn load(&self, name: &str) -> Result<Arc<CorpusGeneration>> {
        if let Some(cached) = self.generations.read().get(name) {
            return Ok(cached.clone());
        }

        let dir = self.generation_dir(name);
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(Error::GenerationNotFound(name.to_string()));
        }
        let manifest: Manifest = serde_json::from_slice(&std::fs::read(&manifest_path)?)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        if manifest.name != name {
            warn!(
                directory = name,
                manifest = %manifest.name,
                "manifest name does not match its directory, using the directory name"
            );
        }

        let documents = artifacts::read_document_names(&dir.join(DOCUMENTS_FILE))?;
        let vocabulary = artifacts::read_vocabulary(&dir.join(VOCABULARY_FILE))?;
        let (corpus, columns) = artifacts::read_matrix(&dir.join(MATRIX_FILE))?;
        if columns != vocabulary.len() {
            return Err(Error::VocabularyMismatch {
                expected: vocabulary.len(),
                actual: columns,
            });
        }
        let tfidf_path = dir.join(TFIDF_FILE);
        let tfidf = if tfidf_path.exists() {
            Some(artifacts::load_bincode(&tfidf_path)?)
        } else {
            None
        };

        let generation = CorpusGeneration::restore(
            name.to_string(),
            manifest.built_at,
            vocabulary,
            documents,
            corpus,
            tfidf,
            manifest.reused_vocabulary_from,
        )?;
        let shared = Arc::new(generation);
        self.generations
            .write()
            .insert(name.to_string(), shared.clone());
        Ok(shared)
    }

    /// Names of every generation on disk, sorted. A directory without a
    /// manifest is not a generation.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() || !entry.path().join(MANIFEST_FILE).exists() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn save_topic_model(&self, name: &str, model: &TopicModel) -> Result<()> {
        if !self.exists(name) {
            return Err(Error::GenerationNotFound(name.to_string()));
        }
        artifacts::save_bincode(&self.generation_dir(name).join(TOPICS_FILE), model)?;
        info!(
            generation = name,
            topics = model.num_topics(),
            "topic model saved"
        );
        Ok(())
    }

    /// Loads the topic model trained for a generation, checking it still
    /// fits the generation's vocabulary.
    pub fn load_topic_model(&self, generation: &CorpusGeneration) -> Result<TopicModel> {
        let path = self.generation_dir(generation.name()).join(TOPICS_FILE);
        if !path.exists() {
            return Err(Error::ModelNotFound(generation.name().to_string()));
        }
        let model: TopicModel = artifacts::load_bincode(&path)?;
        if model.vocab_size() != generation.vocabulary().len() {
            return Err(Error::VocabularyMismatch {
                expected: model.vocab_size(),
                actual: generation.vocabulary().len(),
            });
        }
        Ok(model)
    }

    #[must_use]
    pub fn augmentation_path(&self, name: &str) -> PathBuf {
        self.generation_dir(name).join(AUGMENTATION_FILE)
    }

    /// The per-generation abstracts directory, created on first use.
    pub fn augment_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.generation_dir(name).join(AUGMENT_DIR);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Stores the abstract fetched for one document.
    pub fn write_abstract(&self, name: &str, document: &str, text: &str) -> Result<()> {
        let dir = self.augment_dir(name)?;
        artifacts::write_atomic(&dir.join(document), text.as_bytes())
    }

    /// Abstract text stored for a document, if an augmentation run produced
    /// one.
    pub fn read_abstract(&self, name: &str, document: &str) -> Result<Option<String>> {
        let path = self.generation_dir(name).join(AUGMENT_DIR).join(document);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstopic_core::{SparseVector, TfIdfModel, TopicModel, TrainingConfig, Vocabulary};
    use tempfile::tempdir;

    fn sample_generation(name: &str) -> CorpusGeneration {
        let vocabulary = Vocabulary::build(&[
            vec!["engine".to_string(), "steam".to_string()],
            vec!["steam".to_string(), "brass".to_string()],
        ]);
        let corpus = vec![
            SparseVector::from_entries(vec![(0, 1.0), (1, 1.0)]),
            SparseVector::from_entries(vec![(1, 1.0), (2, 1.0)]),
        ];
        let tfidf = TfIdfModel::fit(&corpus);
        CorpusGeneration::new(
            name,
            vocabulary,
            vec!["a.txt".to_string(), "b.txt".to_string()],
            corpus,
            Some(tfidf),
            None,
        )
        .unwrap()
    }

    #[test]
    fn saved_generations_reload_from_a_fresh_store() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let saved = store.save(sample_generation("ted")).unwrap();

        let reopened = GenerationStore::new(dir.path()).unwrap();
        let loaded = reopened.load("ted").unwrap();
        assert_eq!(loaded.documents(), saved.documents());
        assert_eq!(loaded.corpus(), saved.corpus());
        assert_eq!(loaded.vocabulary().id("brass"), Some(2));
        let model = loaded.tfidf().unwrap();
        assert_eq!(model.num_docs(), 2);
        assert_eq!(model.idf(1), 0.0);
    }

    #[test]
    fn unknown_generations_are_reported_by_name() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, Error::GenerationNotFound(name) if name == "ghost"));
    }

    #[test]
    fn tampered_document_list_fails_alignment_on_load() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        store.save(sample_generation("ted")).unwrap();
        std::fs::write(dir.path().join("ted").join(DOCUMENTS_FILE), "a.txt\n").unwrap();

        let reopened = GenerationStore::new(dir.path()).unwrap();
        let err = reopened.load("ted").unwrap_err();
        assert!(matches!(
            err,
            Error::CorpusMisaligned {
                documents: 1,
                rows: 2
            }
        ));
    }

    #[test]
    fn corrupt_matrix_is_a_parse_error_with_a_line() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        store.save(sample_generation("ted")).unwrap();
        std::fs::write(
            dir.path().join("ted").join(MATRIX_FILE),
            "%%MatrixMarket matrix coordinate real general\n2 3 1\n1 oops 1.0\n",
        )
        .unwrap();

        let reopened = GenerationStore::new(dir.path()).unwrap();
        let err = reopened.load("ted").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn list_is_sorted_and_skips_foreign_directories() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        store.save(sample_generation("zoo")).unwrap();
        store.save(sample_generation("arc")).unwrap();
        std::fs::create_dir_all(dir.path().join("scratch")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["arc", "zoo"]);
    }

    #[test]
    fn topic_models_round_trip_and_validate_vocabulary() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let generation = store.save(sample_generation("ted")).unwrap();

        let config = TrainingConfig {
            num_topics: 2,
            passes: 2,
            ..TrainingConfig::default()
        };
        let model =
            TopicModel::train(generation.corpus(), generation.vocabulary().len(), "ted", &config)
                .unwrap();
        store.save_topic_model("ted", &model).unwrap();
        let loaded = store.load_topic_model(&generation).unwrap();
        assert_eq!(loaded.num_topics(), 2);
        assert_eq!(loaded.trained_on(), "ted");

        let narrow = TopicModel::train(
            &[SparseVector::from_entries(vec![(0, 2.0)])],
            1,
            "narrow",
            &config,
        )
        .unwrap();
        store.save_topic_model("ted", &narrow).unwrap();
        let err = store.load_topic_model(&generation).unwrap_err();
        assert!(matches!(
            err,
            Error::VocabularyMismatch {
                expected: 1,
                actual: 3
            }
        ));
    }

    #[test]
    fn missing_topic_model_is_distinct_from_missing_generation() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let generation = store.save(sample_generation("ted")).unwrap();
        let err = store.load_topic_model(&generation).unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(name) if name == "ted"));

        let orphan = TopicModel::train(generation.corpus(), 3, "ted", &TrainingConfig {
            num_topics: 2,
            passes: 1,
            ..TrainingConfig::default()
        })
        .unwrap();
        let err = store.save_topic_model("ghost", &orphan).unwrap_err();
        assert!(matches!(err, Error::GenerationNotFound(_)));
    }

    #[test]
    fn abstracts_store_per_document_text() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        store.save(sample_generation("scimu")).unwrap();

        assert_eq!(store.read_abstract("scimu", "a.txt").unwrap(), None);
        store
            .write_abstract("scimu", "a.txt", "A rotative beam engine.")
            .unwrap();
        assert_eq!(
            store.read_abstract("scimu", "a.txt").unwrap().as_deref(),
            Some("A rotative beam engine.")
        );
    }
}
