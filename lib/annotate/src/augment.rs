//! Batch annotation and text augmentation over a stored generation.
//!
//! Each document is queried with its own tokens, heaviest first, one chosen
//! annotation is recorded in the augmentation table, and the abstract behind
//! it is stored for later builds to append. Failures degrade to "no
//! annotation" so one bad document or request never sinks the batch, and
//! completed documents are skipped when a run resumes.

use crate::abstracts::AbstractSource;
use crate::client::AnnotationSource;
use crate::disambiguate::{pick_annotation, WEIGHT_TIE_MARGIN};
use crosstopic_core::{ranked_tokens, Error, Result};
use crosstopic_storage::artifacts;
use crosstopic_storage::{CorpusGeneration, GenerationStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Augmentation batch settings.
#[derive(Clone, Debug)]
pub struct AugmentConfig {
    /// Annotation requests in flight at once.
    pub concurrency: usize,
    /// Relative margin for near-tie weights in the disambiguator.
    pub weight_margin: f64,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            weight_margin: WEIGHT_TIE_MARGIN,
        }
    }
}

/// Outcome of one augmentation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AugmentReport {
    /// Documents that gained an annotation row this run.
    pub annotated: usize,
    /// Documents skipped because the table already had them.
    pub skipped: usize,
    /// Documents that produced no usable annotation.
    pub unmatched: usize,
    /// True when the run stopped early on a cancellation request.
    pub cancelled: bool,
}

struct Candidate {
    name: String,
    text: String,
    weights: HashMap<String, f64>,
}

/// Runs the annotation batch over every document of a generation.
///
/// `cancel` is checked between waves of requests; setting it lets the
/// current wave finish and then stops, leaving the table consistent for a
/// resumed run.
pub async fn augment_generation<S, A>(
    store: &GenerationStore,
    generation: &CorpusGeneration,
    source: Arc<S>,
    fetcher: &A,
    config: &AugmentConfig,
    cancel: &AtomicBool,
) -> Result<AugmentReport>
where
    S: AnnotationSource + 'static,
    A: AbstractSource,
{
    let weighting = generation.tfidf().ok_or_else(|| {
        Error::InvalidConfig(format!(
            "generation '{}' carries no weighting model to rank annotation queries",
            generation.name()
        ))
    })?;
    store.augment_dir(generation.name())?;
    let table_path = store.augmentation_path(generation.name());
    let done: HashSet<String> = artifacts::read_augmentation_table(&table_path)?
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    let mut report = AugmentReport::default();
    let mut candidates = Vec::new();
    for (row, name) in generation.documents().iter().enumerate() {
        if done.contains(name) {
            report.skipped += 1;
            continue;
        }
        let ranked = ranked_tokens(
            generation.vocabulary(),
            &weighting.transform(&generation.corpus()[row]),
        );
        if ranked.is_empty() {
            report.unmatched += 1;
            continue;
        }
        let text = ranked
            .iter()
            .map(|(token, _)| token.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        candidates.push(Candidate {
            name: name.clone(),
            text,
            weights: ranked.into_iter().collect(),
        });
    }

    info!(
        generation = generation.name(),
        candidates = candidates.len(),
        skipped = report.skipped,
        "starting annotation batch"
    );

    let mut queue = candidates.into_iter();
    loop {
        if cancel.load(Ordering::Relaxed) {
            report.cancelled = true;
            break;
        }
        let wave: Vec<Candidate> = queue.by_ref().take(config.concurrency.max(1)).collect();
        if wave.is_empty() {
            break;
        }

        let mut tasks = JoinSet::new();
        for candidate in wave {
            let source = source.clone();
            tasks.spawn(async move {
                let annotations = match source.annotate(&candidate.text).await {
                    Ok(annotations) => annotations,
                    Err(e) => {
                        warn!(document = %candidate.name, error = %e, "annotation request failed");
                        Vec::new()
                    }
                };
                (candidate, annotations)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let Ok((candidate, annotations)) = joined else {
                continue;
            };
            let Some(annotation) =
                pick_annotation(&annotations, &candidate.weights, config.weight_margin)
            else {
                report.unmatched += 1;
                continue;
            };
            match fetcher.fetch(&annotation.uri).await {
                Ok(Some(text)) => {
                    store.write_abstract(generation.name(), &candidate.name, &text)?;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        document = %candidate.name,
                        uri = %annotation.uri,
                        error = %e,
                        "abstract fetch failed"
                    );
                }
            }
            artifacts::append_augmentation_row(&table_path, &candidate.name, &annotation.uri)?;
            report.annotated += 1;
        }
    }

    info!(
        generation = generation.name(),
        annotated = report.annotated,
        unmatched = report.unmatched,
        skipped = report.skipped,
        cancelled = report.cancelled,
        "annotation batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Annotation;
    use crosstopic_core::{SparseVector, TfIdfModel, Vocabulary};
    use tempfile::tempdir;

    struct CannedSource {
        trigger: String,
        annotations: Vec<Annotation>,
    }

    impl AnnotationSource for CannedSource {
        async fn annotate(&self, text: &str) -> Result<Vec<Annotation>> {
            if text.contains(&self.trigger) {
                Ok(self.annotations.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct FailingSource;

    impl AnnotationSource for FailingSource {
        async fn annotate(&self, _text: &str) -> Result<Vec<Annotation>> {
            Err(Error::Network("connection refused".to_string()))
        }
    }

    struct CannedAbstracts {
        uri: String,
        text: String,
    }

    impl AbstractSource for CannedAbstracts {
        async fn fetch(&self, uri: &str) -> Result<Option<String>> {
            if uri == self.uri {
                Ok(Some(self.text.clone()))
            } else {
                Ok(None)
            }
        }
    }

    fn stored_generation(store: &GenerationStore) -> Arc<CorpusGeneration> {
        let vocabulary = Vocabulary::build(&[
            vec!["engine".to_string(), "steam".to_string()],
            vec!["engine".to_string(), "pottery".to_string()],
        ]);
        let corpus = vec![
            SparseVector::from_entries(vec![(0, 1.0), (1, 2.0)]),
            SparseVector::from_entries(vec![(0, 1.0), (2, 1.0)]),
        ];
        let tfidf = TfIdfModel::fit(&corpus);
        let generation = CorpusGeneration::new(
            "scimu",
            vocabulary,
            vec!["a.txt".to_string(), "b.txt".to_string()],
            corpus,
            Some(tfidf),
            None,
        )
        .unwrap();
        store.save(generation).unwrap()
    }

    fn steam_source() -> Arc<CannedSource> {
        Arc::new(CannedSource {
            trigger: "steam".to_string(),
            annotations: vec![Annotation {
                uri: "http://dbpedia.org/resource/Steam".to_string(),
                surface_form: "steam".to_string(),
                types: Vec::new(),
                support: 40,
                similarity: 0.8,
            }],
        })
    }

    fn steam_abstracts() -> CannedAbstracts {
        CannedAbstracts {
            uri: "http://dbpedia.org/resource/Steam".to_string(),
            text: "Steam is water in the gas phase.".to_string(),
        }
    }

    #[tokio::test]
    async fn annotated_documents_gain_rows_and_abstracts() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let generation = stored_generation(&store);

        let report = augment_generation(
            &store,
            &generation,
            steam_source(),
            &steam_abstracts(),
            &AugmentConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap();

        assert_eq!(report.annotated, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.skipped, 0);
        assert!(!report.cancelled);

        let rows = artifacts::read_augmentation_table(&store.augmentation_path("scimu")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "a.txt");
        assert_eq!(rows[0].1, "http://dbpedia.org/resource/Steam");
        assert_eq!(
            store.read_abstract("scimu", "a.txt").unwrap().as_deref(),
            Some("Steam is water in the gas phase.")
        );
        assert_eq!(store.read_abstract("scimu", "b.txt").unwrap(), None);
    }

    #[tokio::test]
    async fn a_second_run_skips_recorded_documents() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let generation = stored_generation(&store);

        let first = augment_generation(
            &store,
            &generation,
            steam_source(),
            &steam_abstracts(),
            &AugmentConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap();
        assert_eq!(first.annotated, 1);

        let second = augment_generation(
            &store,
            &generation,
            steam_source(),
            &steam_abstracts(),
            &AugmentConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap();
        assert_eq!(second.skipped, 1);
        assert_eq!(second.annotated, 0);
        assert_eq!(second.unmatched, 1);

        let rows = artifacts::read_augmentation_table(&store.augmentation_path("scimu")).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn request_failures_degrade_to_no_annotation() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let generation = stored_generation(&store);

        let report = augment_generation(
            &store,
            &generation,
            Arc::new(FailingSource),
            &steam_abstracts(),
            &AugmentConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap();

        assert_eq!(report.annotated, 0);
        assert_eq!(report.unmatched, 2);
        assert!(artifacts::read_augmentation_table(&store.augmentation_path("scimu"))
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_first_wave() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let generation = stored_generation(&store);

        let cancel = AtomicBool::new(true);
        let report = augment_generation(
            &store,
            &generation,
            steam_source(),
            &steam_abstracts(),
            &AugmentConfig::default(),
            &cancel,
        )
        .await
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.annotated, 0);
    }

    #[tokio::test]
    async fn unweighted_generations_are_rejected() {
        let dir = tempdir().unwrap();
        let store = GenerationStore::new(dir.path()).unwrap();
        let vocabulary = Vocabulary::build(&[vec!["engine".to_string()]]);
        let generation = store
            .save(
                CorpusGeneration::new(
                    "plain",
                    vocabulary,
                    vec!["a.txt".to_string()],
                    vec![SparseVector::from_entries(vec![(0, 1.0)])],
                    None,
                    None,
                )
                .unwrap(),
            )
            .unwrap();

        let err = augment_generation(
            &store,
            &generation,
            steam_source(),
            &steam_abstracts(),
            &AugmentConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
