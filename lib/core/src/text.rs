//! Text normalization and tokenization.
//!
//! Documents pass through a fixed ladder: punctuation is blanked out, chunks
//! are lowercased and folded to ASCII, stopwords and noise are dropped, the
//! remainder is re-split on word boundaries, optionally filtered to nouns,
//! and finally lemmatized. The same ladder must run over index and query
//! corpora or their vocabularies will not line up.

use std::path::PathBuf;

use ahash::AHashSet;
use unidecode::unidecode;

use crate::error::{Error, Result};
use crate::lemma::{Lemmatizer, MorphyLemmatizer, PartOfSpeech};

/// Patterns blanked to a space before splitting. The bare hyphen is absent on
/// purpose: only free-standing hyphens become boundaries, hyphenated words
/// stay whole.
const PUNCTUATION: &[&str] = &[
    ".", "/", "'", "\"", "?", "!", "#", "$", "%", "^", "&", "*", "(", ")", " - ", "_", "+", "=",
    "@", ":", "\\", ",", ";", "~", "`", "<", ">", "|", "[", "]", "{", "}", "\u{2013}", "\u{201c}",
    "\u{bb}", "\u{ab}", "\u{b0}", "\u{2019}",
];

/// The classic English stopword list.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "should", "now",
];

/// The embedded English stopword list.
#[must_use]
pub fn english_stopwords() -> &'static [&'static str] {
    STOPWORDS
}

/// Decides, per token, whether it reads as a noun in its sentence context.
///
/// No tagger ships with this crate; supply one to enable noun-only
/// tokenization.
pub trait PosTagger: Send + Sync {
    /// Returns one flag per token in `tokens`, in order.
    fn nouns(&self, tokens: &[String]) -> Vec<bool>;
}

/// Tokenizer settings.
#[derive(Clone, Debug, Default)]
pub struct TokenizerConfig {
    /// Path to a whitespace-separated file of additional stopwords, read once
    /// at construction.
    pub extra_stopwords: Option<PathBuf>,
    /// Keep only tokens tagged as nouns. Requires a tagger.
    pub noun_only: bool,
}

/// Turns raw document text into normalized token lists.
pub struct Tokenizer {
    stopwords: AHashSet<String>,
    lemmatizer: Box<dyn Lemmatizer>,
    tagger: Option<Box<dyn PosTagger>>,
    noun_only: bool,
}

impl Tokenizer {
    /// Builds a tokenizer with the default morphological normalizer and no
    /// part-of-speech tagger.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        Self::with_components(config, Box::new(MorphyLemmatizer::new()), None)
    }

    /// Builds a tokenizer from caller-supplied components.
    ///
    /// Fails when `noun_only` is requested without a tagger, or when the
    /// extra stopword file cannot be read.
    pub fn with_components(
        config: TokenizerConfig,
        lemmatizer: Box<dyn Lemmatizer>,
        tagger: Option<Box<dyn PosTagger>>,
    ) -> Result<Self> {
        if config.noun_only && tagger.is_none() {
            return Err(Error::InvalidConfig(
                "noun-only tokenization requires a part-of-speech tagger".to_string(),
            ));
        }
        let mut stopwords: AHashSet<String> = STOPWORDS.iter().map(|s| s.to_string()).collect();
        if let Some(path) = &config.extra_stopwords {
            let text = std::fs::read_to_string(path)?;
            stopwords.extend(text.split_whitespace().map(str::to_lowercase));
        }
        Ok(Self {
            stopwords,
            lemmatizer,
            tagger,
            noun_only: config.noun_only,
        })
    }

    /// Normalizes `text` into its token list. An empty result means the
    /// document carried no usable content.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut cleaned = text.to_string();
        for pattern in PUNCTUATION {
            if cleaned.contains(pattern) {
                cleaned = cleaned.replace(pattern, " ");
            }
        }

        let mut kept: Vec<String> = Vec::new();
        for chunk in cleaned.split_whitespace() {
            let folded = unidecode(chunk.to_lowercase().trim());
            if self.discard(&folded) {
                continue;
            }
            kept.push(folded);
        }

        // ASCII folding can introduce fresh punctuation, so split once more
        // on word boundaries. Hyphens stay part of their word.
        let rejoined = kept.join(" ");
        let mut tokens: Vec<String> = rejoined
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if self.noun_only {
            if let Some(tagger) = &self.tagger {
                let flags = tagger.nouns(&tokens);
                tokens = tokens
                    .into_iter()
                    .zip(flags)
                    .filter_map(|(t, keep)| if keep { Some(t) } else { None })
                    .collect();
            }
        }

        tokens
            .into_iter()
            .map(|t| self.lemmatize(&t))
            .filter(|t| t.len() > 1 && !numeric(t))
            .collect()
    }

    /// Noun reading first; if that changes nothing, retry as a verb.
    fn lemmatize(&self, token: &str) -> String {
        let lemma = self.lemmatizer.lemmatize(token, PartOfSpeech::Noun);
        if lemma == token {
            self.lemmatizer.lemmatize(token, PartOfSpeech::Verb)
        } else {
            lemma
        }
    }

    fn discard(&self, chunk: &str) -> bool {
        chunk.len() <= 1 || numeric(chunk) || self.stopwords.contains(chunk)
    }
}

fn numeric(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
}
