pub mod artifacts;
pub mod generation;
pub mod store;

pub use generation::{CorpusGeneration, Manifest};
pub use store::GenerationStore;
