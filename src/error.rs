// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use crate::embedding::EmbeddingError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository acquisition failed: {0}")]
    Acquisition(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The artifact exists on disk but cannot be read back.
    #[error("Corrupt index artifact {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Index verification failed: {0}")]
    Verification(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOperation {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_display_names_path() {
        let err = IndexError::corrupt("/idx/chunk_map.json", "expected value at line 1");
        let text = err.to_string();
        assert!(text.contains("/idx/chunk_map.json"));
        assert!(text.contains("expected value"));
    }

    #[test]
    fn test_embedding_error_converts() {
        let err: IndexError = EmbeddingError::InvalidInput("empty".to_string()).into();
        assert!(matches!(err, IndexError::Embedding(_)));
    }
}
