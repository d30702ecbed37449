//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the pipeline returns [`SqlSeerError`]. The
//! variants mirror the failure modes of the pipeline stages: loading the
//! schema description, validating retrieval parameters, expanding foreign-key
//! relationships, embedding text, and calling the generation backend.

use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SqlSeerError>;

/// Errors surfaced by the sqlseer pipeline.
#[derive(Debug, Error)]
pub enum SqlSeerError {
    /// The schema description is missing, unreadable, malformed, or contains
    /// a relationship that references a table absent from the tables map.
    #[error("failed to load schema: {0}")]
    SchemaLoad(String),

    /// `k` passed to a similarity search was outside `1..=corpus_len`.
    #[error("top_k must be between 1 and {corpus} inclusive, got {k}")]
    InvalidTopK { k: usize, corpus: usize },

    /// A relationship edge points at a table the schema does not define.
    #[error("relationship references table `{0}` missing from the schema")]
    UnknownRelatedTable(String),

    /// Tokenization or model inference failed while embedding text.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The generation backend was unreachable or returned an error status.
    #[error("generation backend error: {0}")]
    GenerationBackend(#[from] async_openai::error::OpenAIError),

    /// The generation backend did not answer within the configured timeout.
    #[error("generation backend timed out after {0:?}")]
    GenerationTimeout(Duration),

    /// The generation backend answered, but with no usable text.
    #[error("generation backend returned no usable text")]
    EmptyGeneration,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<candle_core::Error> for SqlSeerError {
    fn from(err: candle_core::Error) -> Self {
        Self::Embedding(err.to_string())
    }
}
