// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod store;
pub mod utils;

pub use config::{ChunkingConfig, Config, EmbeddingConfig, IndexConfig};
pub use embedding::{EmbeddingError, EmbeddingProvider, HashEmbedding, HttpEmbeddingClient};
pub use error::{IndexError, Result};
pub use indexer::{IndexRequest, IndexService, LoadedIndex, RepositoryIndexer};
pub use models::{Document, IndexMetadata, IndexRepositoryResponse, SearchResult, Status};
pub use pipeline::{LogProgress, ProgressSink, ProgressTracker};
pub use repository::{FileScanner, ScannedFile, TextSplitter};
pub use store::{ChunkMap, FlatIndex, VectorStore};
pub use utils::{OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        let _splitter = TextSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap)
            .unwrap();
        let _embeddings = HashEmbedding::new(8);
    }
}
