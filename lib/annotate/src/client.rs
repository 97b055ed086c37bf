//! HTTP client for the entity-annotation web service.
//!
//! The service takes free text and returns knowledge-base resources spotted
//! in it. Numeric fields in its JSON responses sometimes arrive as strings,
//! so the wire types accept both encodings.

use crosstopic_core::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::future::Future;
use std::time::Duration;

/// Public annotation endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.dbpedia-spotlight.org/en/annotate";

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// Some knowledge-base frontends reject requests without a browser-like
// user agent.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:13.0) Gecko/20100101 Firefox/13.0.1";

/// Anything that can annotate free text with knowledge-base entities.
pub trait AnnotationSource: Send + Sync {
    fn annotate(&self, text: &str) -> impl Future<Output = Result<Vec<Annotation>>> + Send;
}

/// One spotted entity: the resource it links to and the scores behind the
/// link.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub uri: String,
    pub surface_form: String,
    pub types: Vec<String>,
    pub support: i64,
    pub similarity: f64,
}

/// Query parameters sent with every annotation request.
#[derive(Clone, Debug)]
pub struct AnnotationParams {
    /// Confidence threshold for spotted entities, in `[0, 1]`.
    pub confidence: f64,
    /// Minimum number of inlinks a resource needs to be spotted.
    pub support: u32,
    /// Spotting algorithm to run on the service side.
    pub spotter: String,
    pub coreference_resolution: Option<String>,
    /// Comma-separated ontology types to restrict the entities to.
    pub types: Option<String>,
    pub disambiguators: Option<String>,
}

impl Default for AnnotationParams {
    fn default() -> Self {
        Self {
            confidence: 0.4,
            support: 20,
            spotter: "LingPipeSpotter".to_string(),
            coreference_resolution: None,
            types: None,
            disambiguators: None,
        }
    }
}

impl AnnotationParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidConfig(format!(
                "confidence must lie in [0, 1], got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Client for a DBpedia Spotlight-compatible annotation endpoint.
pub struct SpotlightClient {
    http: reqwest::Client,
    endpoint: String,
    params: AnnotationParams,
}

impl SpotlightClient {
    pub fn new(endpoint: impl Into<String>, params: AnnotationParams) -> Result<Self> {
        params.validate()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            params,
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<Annotation>> {
        let mut form: Vec<(&str, String)> = vec![
            ("text", text.to_string()),
            ("confidence", self.params.confidence.to_string()),
            ("support", self.params.support.to_string()),
            ("spotter", self.params.spotter.clone()),
        ];
        if let Some(value) = &self.params.coreference_resolution {
            form.push(("coreferenceResolution", value.clone()));
        }
        if let Some(value) = &self.params.types {
            form.push(("types", value.clone()));
        }
        if let Some(value) = &self.params.disambiguators {
            form.push(("disambiguators", value.clone()));
        }

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "annotation endpoint returned {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        parse_response(&body)
    }
}

impl AnnotationSource for SpotlightClient {
    async fn annotate(&self, text: &str) -> Result<Vec<Annotation>> {
        self.request(text).await
    }
}

fn parse_response(body: &str) -> Result<Vec<Annotation>> {
    let parsed: SpotlightResponse =
        serde_json::from_str(body).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(parsed
        .resources
        .into_iter()
        .map(SpotlightResource::into_annotation)
        .collect())
}

#[derive(Deserialize)]
struct SpotlightResponse {
    #[serde(rename = "Resources", default)]
    resources: Vec<SpotlightResource>,
}

#[derive(Deserialize)]
struct SpotlightResource {
    #[serde(rename = "@URI")]
    uri: String,
    #[serde(rename = "@surfaceForm")]
    surface_form: String,
    #[serde(rename = "@types", default)]
    types: String,
    #[serde(rename = "@support", deserialize_with = "string_or_i64")]
    support: i64,
    #[serde(rename = "@similarityScore", deserialize_with = "string_or_f64")]
    similarity: f64,
}

impl SpotlightResource {
    fn into_annotation(self) -> Annotation {
        let types = self
            .types
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Annotation {
            uri: self.uri,
            surface_form: self.surface_form,
            types,
            support: self.support,
            similarity: self.similarity,
        }
    }
}

fn string_or_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn string_or_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
