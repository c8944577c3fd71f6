use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// External capability a failing call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStage {
    Embedding,
    Summarization,
    Rendering,
}

impl fmt::Display for ModelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Embedding => "embedding",
            Self::Summarization => "summarization",
            Self::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to ingest {}: {reason}", .path.display())]
    Ingestion { path: PathBuf, reason: String },

    #[error("Corpus produced no chunks ({files} file(s) seen, {failures} failed to parse)")]
    EmptyCorpus { files: usize, failures: usize },

    #[error("The vector index holds no chunks")]
    EmptyIndex,

    #[error("Dimension mismatch at vector {offset}: expected {expected}, got {actual}")]
    DimensionMismatch { offset: usize, expected: usize, actual: usize },

    #[error("Embedder returned {actual} vector(s) for {expected} input(s)")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("Please enter a question")]
    InvalidQuestion,

    #[error("{stage} backend failed: {message}")]
    ModelInvocation { stage: ModelStage, message: String },

    #[error("Diagram rendering failed: {0}")]
    Render(String),

    #[error("{stage} call timed out after {:.1}s", .after.as_secs_f32())]
    Timeout { stage: ModelStage, after: Duration },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Request queue is full")]
    QueueFull,

    #[error("Request queue is closed")]
    QueueClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn model(stage: ModelStage, err: impl fmt::Display) -> Self {
        match stage {
            ModelStage::Rendering => Self::Render(err.to_string()),
            _ => Self::ModelInvocation { stage, message: err.to_string() },
        }
    }

    /// Only backend invocation failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelInvocation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
