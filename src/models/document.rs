// file: src/models/document.rs
// description: chunk document model stored in the vector store docstore
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// One embedded chunk as kept in `docstore.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source file, relative to the repository root.
    pub source: String,
    /// Position of the chunk in the chunk map.
    pub chunk_id: usize,
}

impl Document {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>, chunk_id: usize) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                chunk_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json_shape() {
        let doc = Document::new("fn main() {}", "src/main.rs", 3);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["page_content"], "fn main() {}");
        assert_eq!(value["metadata"]["source"], "src/main.rs");
        assert_eq!(value["metadata"]["chunk_id"], 3);
    }
}
