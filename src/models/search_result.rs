// file: src/models/search_result.rs
// description: Search result model with similarity scores
// reference: Used for vector similarity search results

use crate::models::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Repository the hit came from
    pub repository_name: String,

    /// Source file relative to the repository root
    pub file_path: String,

    /// Chunk position in the chunk map
    pub chunk_id: usize,

    /// Chunk text
    pub content: String,

    /// Similarity score (higher is more similar, in (0.0, 1.0])
    pub score: f32,

    /// L2 distance reported by the index (lower is more similar)
    pub distance: f32,
}

impl SearchResult {
    pub fn from_hit(repository_name: &str, document: Document, distance: f32) -> Self {
        Self {
            repository_name: repository_name.to_string(),
            file_path: document.metadata.source,
            chunk_id: document.metadata.chunk_id,
            content: document.page_content,
            score: Self::relevance(distance),
            distance,
        }
    }

    /// Map an L2 distance onto a similarity score: `1 / (1 + distance)`.
    pub fn relevance(distance: f32) -> f32 {
        1.0 / (1.0 + distance.max(0.0))
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let content_preview = if self.content.chars().count() > max_content_len {
            let truncated: String = self.content.chars().take(max_content_len).collect();
            format!("{}...", truncated)
        } else {
            self.content.clone()
        };

        format!(
            "Score: {:.4} | {} ({})\n{}\n",
            self.score, self.file_path, self.repository_name, content_preview
        )
    }
}
