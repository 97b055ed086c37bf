//! Abstract text for annotated resources.
//!
//! A `/resource/` URI is rewritten to the knowledge base's JSON
//! serialization under `/data/`, the abstract property values are collected,
//! and the English variant is picked by English-stopword overlap. The
//! variants carry no reliable language tag in every serialization, which is
//! why the overlap heuristic decides.

use crate::client::{REQUEST_TIMEOUT, USER_AGENT};
use crosstopic_core::{english_stopwords, Error, Result};
use std::collections::HashSet;
use std::future::Future;

/// Anything that resolves an annotation URI to abstract text.
pub trait AbstractSource: Send + Sync {
    fn fetch(&self, uri: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Fetches abstracts over HTTP from the knowledge base behind the URIs.
pub struct AbstractFetcher {
    http: reqwest::Client,
}

impl AbstractFetcher {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { http })
    }

    async fn request(&self, uri: &str) -> Result<Option<String>> {
        let url = data_url(uri);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "resource endpoint returned {} for {url}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(english_variant(collect_abstracts(&value)))
    }
}

impl AbstractSource for AbstractFetcher {
    async fn fetch(&self, uri: &str) -> Result<Option<String>> {
        self.request(uri).await
    }
}

/// Rewrites a resource URI into the URL of its JSON serialization,
/// undoing the percent-encodings annotation URIs arrive with.
fn data_url(uri: &str) -> String {
    let decoded = uri
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%27", "'")
        .replace("%2D", "-");
    match decoded.split_once("/resource/") {
        Some((host, name)) => format!("{host}/data/{name}.json"),
        None => decoded,
    }
}

/// Every abstract-property literal in the resource document, any language.
fn collect_abstracts(value: &serde_json::Value) -> Vec<String> {
    let mut texts = Vec::new();
    let Some(resources) = value.as_object() else {
        return texts;
    };
    for predicates in resources.values() {
        let Some(predicates) = predicates.as_object() else {
            continue;
        };
        for (predicate, literals) in predicates {
            if !predicate.ends_with("/abstract") {
                continue;
            }
            let Some(literals) = literals.as_array() else {
                continue;
            };
            for literal in literals {
                if let Some(text) = literal.get("value").and_then(|v| v.as_str()) {
                    texts.push(text.to_string());
                }
            }
        }
    }
    texts
}

/// The variant with the most distinct English stopwords wins; earlier
/// variants win ties. A variant with no English stopwords at all is never
/// picked.
fn english_variant(texts: Vec<String>) -> Option<String> {
    let stopwords: HashSet<&str> = english_stopwords().iter().copied().collect();
    let mut best: Option<(String, usize)> = None;
    for text in texts {
        let lowered = text.to_lowercase();
        let overlap = lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty() && stopwords.contains(w))
            .collect::<HashSet<_>>()
            .len();
        if overlap == 0 {
            continue;
        }
        let better = match &best {
            Some((_, count)) => overlap > *count,
            None => true,
        };
        if better {
            best = Some((text, overlap));
        }
    }
    best.map(|(text, _)| text)
}
