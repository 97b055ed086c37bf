use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Generation not found: {0}")]
    GenerationNotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Topic model not found: {0}")]
    ModelNotFound(String),

    #[error("Row {row} out of range for corpus of {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("Corpus misaligned: {documents} document names, {rows} vector rows")]
    CorpusMisaligned { documents: usize, rows: usize },

    #[error("Vocabulary mismatch: expected {expected} tokens, found {actual}")]
    VocabularyMismatch { expected: usize, actual: usize },

    #[error("Token id {id} out of range for vocabulary of {vocabulary} tokens")]
    TokenIdOutOfRange { id: u32, vocabulary: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
