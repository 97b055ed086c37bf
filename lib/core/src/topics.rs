//! Latent topic model over a bag-of-words corpus.
//!
//! Training runs collapsed Gibbs sampling: every token occurrence carries a
//! topic assignment, and each pass resamples assignments from the count
//! matrices. The seeded generator makes a given corpus and configuration
//! reproduce the same model bit for bit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corpus::SparseVector;
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// Gibbs sampling settings.
#[derive(Clone, Debug)]
pub struct TrainingConfig {
    pub num_topics: usize,
    /// Document-topic smoothing prior; defaults to `50 / num_topics`.
    pub alpha: Option<f64>,
    /// Topic-token smoothing prior.
    pub beta: f64,
    /// Full sweeps over the corpus.
    pub passes: usize,
    /// Documents visited per chunk.
    pub chunksize: usize,
    /// Progress is reported every this many chunks; 0 reports per pass.
    pub update_every: usize,
    pub seed: u64,
    /// Topic contributions below this are dropped when transforming.
    pub min_contribution: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_topics: 150,
            alpha: None,
            beta: 0.01,
            passes: 7,
            chunksize: 80,
            update_every: 1,
            seed: 42,
            min_contribution: 0.01,
        }
    }
}

impl TrainingConfig {
    fn effective_alpha(&self) -> f64 {
        self.alpha.unwrap_or(50.0 / self.num_topics as f64)
    }

    fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(Error::InvalidConfig("num_topics must be positive".into()));
        }
        if self.passes == 0 {
            return Err(Error::InvalidConfig("passes must be positive".into()));
        }
        if self.chunksize == 0 {
            return Err(Error::InvalidConfig("chunksize must be positive".into()));
        }
        if self.beta <= 0.0 {
            return Err(Error::InvalidConfig("beta must be positive".into()));
        }
        if let Some(alpha) = self.alpha {
            if alpha <= 0.0 {
                return Err(Error::InvalidConfig("alpha must be positive".into()));
            }
        }
        if !(0.0..1.0).contains(&self.min_contribution) {
            return Err(Error::InvalidConfig(
                "min_contribution must lie in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// A fitted topic model: per-topic token distributions plus the priors and
/// provenance needed to validate reuse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopicModel {
    num_topics: usize,
    vocab_size: usize,
    alpha: f64,
    beta: f64,
    min_contribution: f64,
    /// `phi[k][w]`: probability of token `w` under topic `k`.
    phi: Vec<Vec<f64>>,
    trained_on: String,
}

impl TopicModel {
    /// Fits a model over count vectors. Every token id in `corpus` must lie
    /// below `vocab_size`.
    pub fn train(
        corpus: &[SparseVector],
        vocab_size: usize,
        trained_on: &str,
        config: &TrainingConfig,
    ) -> Result<Self> {
        config.validate()?;
        let k = config.num_topics;
        let alpha = config.effective_alpha();
        let beta = config.beta;
        let vbeta = beta * vocab_size as f64;

        // One entry per token occurrence, in document order.
        let mut docs: Vec<Vec<u32>> = Vec::with_capacity(corpus.len());
        for vector in corpus {
            let mut words = Vec::new();
            for &(id, count) in vector.entries() {
                if id as usize >= vocab_size {
                    return Err(Error::VocabularyMismatch {
                        expected: vocab_size,
                        actual: id as usize + 1,
                    });
                }
                for _ in 0..count.round() as usize {
                    words.push(id);
                }
            }
            docs.push(words);
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut doc_topic = vec![vec![0u32; k]; docs.len()];
        let mut topic_token = vec![vec![0u32; vocab_size]; k];
        let mut topic_total = vec![0u32; k];
        let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(docs.len());

        for (d, words) in docs.iter().enumerate() {
            let mut z = Vec::with_capacity(words.len());
            for &w in words {
                let topic = rng.random_range(0..k);
                doc_topic[d][topic] += 1;
                topic_token[topic][w as usize] += 1;
                topic_total[topic] += 1;
                z.push(topic);
            }
            assignments.push(z);
        }

        let mut weights = vec![0.0f64; k];
        for pass in 0..config.passes {
            let mut chunks_done = 0usize;
            for chunk_start in (0..docs.len()).step_by(config.chunksize) {
                let chunk_end = (chunk_start + config.chunksize).min(docs.len());
                for d in chunk_start..chunk_end {
                    for i in 0..docs[d].len() {
                        let w = docs[d][i] as usize;
                        let old = assignments[d][i];
                        doc_topic[d][old] -= 1;
                        topic_token[old][w] -= 1;
                        topic_total[old] -= 1;

                        let mut total = 0.0;
                        for (t, weight) in weights.iter_mut().enumerate() {
                            *weight = (f64::from(doc_topic[d][t]) + alpha)
                                * (f64::from(topic_token[t][w]) + beta)
                                / (f64::from(topic_total[t]) + vbeta);
                            total += *weight;
                        }
                        let mut draw = rng.random::<f64>() * total;
                        let mut new = k - 1;
                        for (t, &weight) in weights.iter().enumerate() {
                            if draw < weight {
                                new = t;
                                break;
                            }
                            draw -= weight;
                        }

                        doc_topic[d][new] += 1;
                        topic_token[new][w] += 1;
                        topic_total[new] += 1;
                        assignments[d][i] = new;
                    }
                }
                chunks_done += 1;
                if config.update_every > 0 && chunks_done % config.update_every == 0 {
                    debug!(pass = pass + 1, chunks = chunks_done, "sampled document chunk");
                }
            }
            info!(
                pass = pass + 1,
                passes = config.passes,
                "completed sampling pass"
            );
        }

        let phi = (0..k)
            .map(|t| {
                (0..vocab_size)
                    .map(|w| {
                        (f64::from(topic_token[t][w]) + beta) / (f64::from(topic_total[t]) + vbeta)
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            num_topics: k,
            vocab_size,
            alpha,
            beta,
            min_contribution: config.min_contribution,
            phi,
            trained_on: trained_on.to_string(),
        })
    }

    #[inline]
    #[must_use]
    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    #[inline]
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    #[inline]
    #[must_use]
    pub fn trained_on(&self) -> &str {
        &self.trained_on
    }

    /// Topic mixture of a count vector, strongest topic first. Contributions
    /// below the configured minimum are dropped.
    #[must_use]
    pub fn transform(&self, vector: &SparseVector) -> Vec<(usize, f64)> {
        let weights = self.project(vector);
        let mut topics: Vec<(usize, f64)> = weights
            .into_iter()
            .enumerate()
            .filter(|&(_, w)| w >= self.min_contribution)
            .collect();
        topics.sort_by(|a, b| b.1.total_cmp(&a.1));
        topics
    }

    /// Topic mixture as a dense vector of length `num_topics`, with
    /// sub-threshold contributions zeroed.
    #[must_use]
    pub fn dense_topics(&self, vector: &SparseVector) -> Vec<f64> {
        self.project(vector)
            .into_iter()
            .map(|w| if w >= self.min_contribution { w } else { 0.0 })
            .collect()
    }

    /// The `n` heaviest tokens of one topic.
    pub fn top_tokens(
        &self,
        topic: usize,
        n: usize,
        vocabulary: &Vocabulary,
    ) -> Result<Vec<(String, f64)>> {
        let row = self.phi.get(topic).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "topic {topic} out of range for {} topics",
                self.num_topics
            ))
        })?;
        let mut ranked: Vec<(String, f64)> = row
            .iter()
            .enumerate()
            .filter_map(|(w, &p)| vocabulary.token(w as u32).map(|t| (t.to_string(), p)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        Ok(ranked)
    }

    fn project(&self, vector: &SparseVector) -> Vec<f64> {
        let mut weights = vec![0.0f64; self.num_topics];
        for &(id, count) in vector.entries() {
            let w = id as usize;
            if w >= self.vocab_size {
                continue;
            }
            for (t, weight) in weights.iter_mut().enumerate() {
                *weight += count * self.phi[t][w];
            }
        }
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for weight in &mut weights {
                *weight /= total;
            }
        }
        weights
    }
}
