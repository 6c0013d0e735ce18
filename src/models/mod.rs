// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod metadata;
pub mod response;
pub mod search_result;

pub use document::{Document, DocumentMetadata};
pub use metadata::IndexMetadata;
pub use response::{IndexRepositoryResponse, Status};
pub use search_result::SearchResult;
