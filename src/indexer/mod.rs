// file: src/indexer/mod.rs
// description: repository indexing module exports
// reference: internal module structure

pub mod manager;
pub mod service;

pub use manager::{IndexRequest, LoadedIndex, REPOSITORY_DIR, RepositoryIndexer};
pub use service::IndexService;
