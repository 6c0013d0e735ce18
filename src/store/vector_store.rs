// file: src/store/vector_store.rs
// description: vector store combining the flat index, docstore and position mapping
// reference: docstore + index_to_docstore_id vector store layout

use crate::embedding::EmbeddingProvider;
use crate::error::{IndexError, Result};
use crate::models::Document;
use crate::store::flat::FlatIndex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Document id → document.
pub type DocStore = BTreeMap<String, Document>;

/// Index position → document id.
pub type IndexMapping = BTreeMap<usize, String>;

pub struct VectorStore {
    embeddings: Arc<dyn EmbeddingProvider>,
    index: FlatIndex,
    docstore: DocStore,
    index_to_docstore_id: IndexMapping,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("model", &self.embeddings.model_id())
            .field("dimension", &self.index.dimension())
            .field("vectors", &self.index.len())
            .field("documents", &self.docstore.len())
            .finish()
    }
}

impl VectorStore {
    /// Embed `documents` in one batch and build a store over them.
    ///
    /// Positions follow input order; each document gets a fresh UUID.
    pub fn from_documents(
        documents: Vec<Document>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();

        info!(
            "Embedding {} documents with {}",
            texts.len(),
            embeddings.model_id()
        );
        let vectors = embeddings.embed_documents(&texts)?;

        if vectors.len() != documents.len() {
            return Err(IndexError::VectorIndex(format!(
                "Embedding count mismatch: expected {}, got {}",
                documents.len(),
                vectors.len()
            )));
        }

        let dimension = vectors
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| embeddings.dimension());
        let mut index = FlatIndex::new(dimension);
        let mut docstore = DocStore::new();
        let mut index_to_docstore_id = IndexMapping::new();

        for (document, vector) in documents.into_iter().zip(vectors) {
            let position = index.add(&vector)?;
            let doc_id = Uuid::new_v4().to_string();
            docstore.insert(doc_id.clone(), document);
            index_to_docstore_id.insert(position, doc_id);
        }

        debug!("Vector store created with {} documents", docstore.len());

        Ok(Self {
            embeddings,
            index,
            docstore,
            index_to_docstore_id,
        })
    }

    /// Assemble a store from restored parts, checking they agree with each other.
    ///
    /// `origin` is only used to label errors.
    pub fn from_parts(
        embeddings: Arc<dyn EmbeddingProvider>,
        index: FlatIndex,
        docstore: DocStore,
        index_to_docstore_id: IndexMapping,
        origin: &Path,
    ) -> Result<Self> {
        if index_to_docstore_id.len() != index.len() {
            return Err(IndexError::corrupt(
                origin,
                format!(
                    "mapping has {} entries but index holds {} vectors",
                    index_to_docstore_id.len(),
                    index.len()
                ),
            ));
        }

        for (position, doc_id) in &index_to_docstore_id {
            if *position >= index.len() {
                return Err(IndexError::corrupt(
                    origin,
                    format!("mapping position {} is outside the index", position),
                ));
            }
            if !docstore.contains_key(doc_id) {
                return Err(IndexError::corrupt(
                    origin,
                    format!("mapping references unknown document id {}", doc_id),
                ));
            }
        }

        Ok(Self {
            embeddings,
            index,
            docstore,
            index_to_docstore_id,
        })
    }

    /// Documents closest to `query` with their L2 distances, closest first.
    pub fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embeddings.embed_query(query)?;
        let hits = self.index.search(&query_vector, k)?;

        Ok(hits
            .into_iter()
            .filter_map(|(position, distance)| {
                self.index_to_docstore_id
                    .get(&position)
                    .and_then(|id| self.docstore.get(id))
                    .map(|doc| (doc.clone(), distance))
            })
            .collect())
    }

    pub fn document_at(&self, position: usize) -> Option<&Document> {
        self.index_to_docstore_id
            .get(&position)
            .and_then(|id| self.docstore.get(id))
    }

    pub fn len(&self) -> usize {
        self.docstore.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docstore.is_empty()
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn docstore(&self) -> &DocStore {
        &self.docstore
    }

    pub fn index_to_docstore_id(&self) -> &IndexMapping {
        &self.index_to_docstore_id
    }

    pub fn embeddings(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embeddings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedding;
    use std::path::PathBuf;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("def calculate_sum(a, b): return a + b", "src/utils.py", 0),
            Document::new("# API Documentation for get_user", "docs/api.md", 1),
            Document::new("print hello world from main", "src/main.py", 2),
        ]
    }

    #[test]
    fn test_from_documents_assigns_positions_in_order() {
        let store = VectorStore::from_documents(docs(), Arc::new(HashEmbedding::new(64))).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.index().len(), 3);
        assert_eq!(store.document_at(1).unwrap().metadata.source, "docs/api.md");
        assert_eq!(store.document_at(2).unwrap().metadata.chunk_id, 2);
    }

    #[test]
    fn test_similarity_search_ranks_matching_chunk_first() {
        let store = VectorStore::from_documents(docs(), Arc::new(HashEmbedding::new(256))).unwrap();
        let hits = store
            .similarity_search_with_score("calculate sum", 2)
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.metadata.source, "src/utils.py");
        assert!(hits[0].1 <= hits[1].1);
    }

    #[test]
    fn test_from_parts_rejects_dangling_mapping() {
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::new(2));
        let index = FlatIndex::from_raw(2, vec![0.0, 1.0]).unwrap();
        let mapping = IndexMapping::from([(0, "missing".to_string())]);

        let result = VectorStore::from_parts(
            embeddings,
            index,
            DocStore::new(),
            mapping,
            &PathBuf::from("/idx"),
        );
        assert!(matches!(result, Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn test_empty_search() {
        let store =
            VectorStore::from_documents(Vec::new(), Arc::new(HashEmbedding::new(8))).unwrap();
        assert!(store.is_empty());
        assert!(store.similarity_search_with_score("x", 3).unwrap().is_empty());
    }
}
