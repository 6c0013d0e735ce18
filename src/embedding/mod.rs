// file: src/embedding/mod.rs
// description: embedding provider module exports
// reference: internal module structure

pub mod hashing;
pub mod http;
pub mod provider;

pub use hashing::HashEmbedding;
pub use http::HttpEmbeddingClient;
pub use provider::{EmbeddingError, EmbeddingProvider};
