//! Knowledge-base annotation and corpus augmentation.
//!
//! Documents are sent to a DBpedia Spotlight endpoint as ranked token
//! queries, the returned annotations are disambiguated against per-token
//! weights, and the abstracts behind the chosen entities are fetched and
//! stored so later corpus builds can fold them into the document text.

pub mod abstracts;
pub mod augment;
pub mod client;
pub mod disambiguate;
pub mod media;

pub use abstracts::{AbstractFetcher, AbstractSource};
pub use augment::{augment_generation, AugmentConfig, AugmentReport};
pub use client::{Annotation, AnnotationParams, AnnotationSource, SpotlightClient, DEFAULT_ENDPOINT};
pub use disambiguate::{pick_annotation, WEIGHT_TIE_MARGIN};
pub use media::MediaDownloader;
