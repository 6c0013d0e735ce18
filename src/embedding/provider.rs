// file: src/embedding/provider.rs
// description: embedding provider abstraction shared by index build and query paths
// reference: https://docs.rs/thiserror

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding generation failed: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Turns text into fixed-length vectors.
///
/// A live provider handle is required both to build an index and to restore one,
/// since a restored store must still embed future queries.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of document texts, one vector per input in input order.
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query string.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;

    /// Model identifier recorded in index metadata.
    fn model_id(&self) -> &str;
}

pub(crate) fn check_dimension(vector: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}
