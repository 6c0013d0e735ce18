// file: src/store/codec.rs
// description: save and load a vector store as a directory of files
// reference: https://docs.rs/arrow/latest/arrow/ipc/index.html

use crate::embedding::EmbeddingProvider;
use crate::error::{IndexError, Result};
use crate::store::flat::FlatIndex;
use crate::store::vector_store::{DocStore, IndexMapping, VectorStore};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const INDEX_FILE: &str = "index.arrow";
pub const DOCSTORE_FILE: &str = "docstore.json";
pub const MAPPING_FILE: &str = "index_mapping.json";

const VECTOR_COLUMN: &str = "vector";
const DIMENSION_KEY: &str = "dimension";

/// Arrow schema of the vector file: one fixed-size list column of f32.
pub fn vector_schema(dimension: usize) -> Arc<Schema> {
    let metadata = HashMap::from([(DIMENSION_KEY.to_string(), dimension.to_string())]);
    Arc::new(
        Schema::new(vec![Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension as i32,
            ),
            false,
        )])
        .with_metadata(metadata),
    )
}

/// Write `store` into `dir` as `index.arrow`, `docstore.json` and `index_mapping.json`.
pub fn save(store: &VectorStore, dir: &Path) -> Result<()> {
    if store.index().is_empty() {
        return Err(IndexError::VectorIndex(
            "refusing to save an empty vector store".to_string(),
        ));
    }

    fs::create_dir_all(dir).map_err(|e| IndexError::file(dir, e))?;

    write_vectors(store.index(), &dir.join(INDEX_FILE))?;

    let docstore_path = dir.join(DOCSTORE_FILE);
    write_json(&docstore_path, store.docstore())?;

    // JSON object keys are strings
    let mapping: BTreeMap<String, &String> = store
        .index_to_docstore_id()
        .iter()
        .map(|(position, id)| (position.to_string(), id))
        .collect();
    write_json(&dir.join(MAPPING_FILE), &mapping)?;

    info!(
        "Saved {} vectors (dimension {}) to {}",
        store.index().len(),
        store.index().dimension(),
        dir.display()
    );
    Ok(())
}

/// Restore a store previously written by [`save`].
///
/// `Ok(None)` when `dir` holds no vector file; any unreadable or inconsistent
/// part is [`IndexError::Corrupt`].
pub fn load(dir: &Path, embeddings: Arc<dyn EmbeddingProvider>) -> Result<Option<VectorStore>> {
    let index_path = dir.join(INDEX_FILE);
    if !index_path.exists() {
        if dir.join(DOCSTORE_FILE).exists() || dir.join(MAPPING_FILE).exists() {
            return Err(IndexError::corrupt(
                &index_path,
                "vector file is missing but its docstore or mapping is present",
            ));
        }
        debug!("No vector file at {}", index_path.display());
        return Ok(None);
    }

    let index = read_vectors(&index_path)?;

    let docstore_path = dir.join(DOCSTORE_FILE);
    let docstore: DocStore = read_json(&docstore_path)?;

    let mapping_path = dir.join(MAPPING_FILE);
    let raw_mapping: BTreeMap<String, String> = read_json(&mapping_path)?;
    let mut mapping = IndexMapping::new();
    for (key, id) in raw_mapping {
        let position = key.parse::<usize>().map_err(|_| {
            IndexError::corrupt(&mapping_path, format!("invalid position key {:?}", key))
        })?;
        mapping.insert(position, id);
    }

    let store = VectorStore::from_parts(embeddings, index, docstore, mapping, dir)?;
    debug!("Loaded {} vectors from {}", store.index().len(), dir.display());
    Ok(Some(store))
}

fn write_vectors(index: &FlatIndex, path: &Path) -> Result<()> {
    let schema = vector_schema(index.dimension());
    let values = Float32Array::from(index.raw().to_vec());
    let vectors = FixedSizeListArray::try_new(
        Arc::new(Field::new("item", DataType::Float32, true)),
        index.dimension() as i32,
        Arc::new(values),
        None,
    )?;
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(vectors)])?;

    let file = File::create(path).map_err(|e| IndexError::file(path, e))?;
    let mut writer = FileWriter::try_new(BufWriter::new(file), &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

fn read_vectors(path: &Path) -> Result<FlatIndex> {
    let file = File::open(path).map_err(|e| IndexError::corrupt(path, e.to_string()))?;
    let reader = FileReader::try_new(BufReader::new(file), None)
        .map_err(|e| IndexError::corrupt(path, e.to_string()))?;

    let schema = reader.schema();
    let dimension = schema
        .metadata()
        .get(DIMENSION_KEY)
        .and_then(|d| d.parse::<usize>().ok())
        .ok_or_else(|| IndexError::corrupt(path, "missing dimension metadata"))?;

    let mut data = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| IndexError::corrupt(path, e.to_string()))?;
        let column = batch
            .column_by_name(VECTOR_COLUMN)
            .ok_or_else(|| IndexError::corrupt(path, "missing vector column"))?;
        let list = column
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| IndexError::corrupt(path, "vector column is not a fixed-size list"))?;
        if list.value_length() as usize != dimension {
            return Err(IndexError::corrupt(
                path,
                format!(
                    "vector width {} does not match dimension {}",
                    list.value_length(),
                    dimension
                ),
            ));
        }
        let values = list
            .values()
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| IndexError::corrupt(path, "vector values are not f32"))?;
        data.extend_from_slice(values.values());
    }

    FlatIndex::from_raw(dimension, data).map_err(|e| IndexError::corrupt(path, e.to_string()))
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| IndexError::file(path, e))?;
    serde_json::to_writer(BufWriter::new(file), value)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(IndexError::corrupt(path, "file is missing"));
        }
        Err(e) => return Err(IndexError::corrupt(path, e.to_string())),
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|e| IndexError::corrupt(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedding;
    use crate::models::Document;
    use tempfile::TempDir;

    fn store() -> VectorStore {
        let docs = vec![
            Document::new("fn main() { println!(\"hi\") }", "src/main.rs", 0),
            Document::new("# Title\nSome readme text", "README.md", 1),
        ];
        VectorStore::from_documents(docs, Arc::new(HashEmbedding::new(32))).unwrap()
    }

    #[test]
    fn test_save_and_load_preserves_contents() {
        let dir = TempDir::new().unwrap();
        let original = store();
        save(&original, dir.path()).unwrap();

        assert!(dir.path().join(INDEX_FILE).exists());
        assert!(dir.path().join(DOCSTORE_FILE).exists());
        assert!(dir.path().join(MAPPING_FILE).exists());

        let loaded = load(dir.path(), Arc::new(HashEmbedding::new(32)))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.index(), original.index());
        assert_eq!(loaded.docstore(), original.docstore());
        assert_eq!(loaded.index_to_docstore_id(), original.index_to_docstore_id());

        let hits = loaded.similarity_search_with_score("readme text", 1).unwrap();
        assert_eq!(hits[0].0.metadata.source, "README.md");
    }

    #[test]
    fn test_mapping_keys_are_strings() {
        let dir = TempDir::new().unwrap();
        save(&store(), dir.path()).unwrap();

        let raw = fs::read_to_string(dir.path().join(MAPPING_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("0").is_some());
        assert!(value.get("1").is_some());
    }

    #[test]
    fn test_load_missing_directory_is_none() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("absent"), Arc::new(HashEmbedding::new(4))).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_truncated_vector_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        save(&store(), dir.path()).unwrap();
        fs::write(dir.path().join(INDEX_FILE), b"ARROW1").unwrap();

        let result = load(dir.path(), Arc::new(HashEmbedding::new(32)));
        assert!(matches!(result, Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn test_load_missing_vector_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        save(&store(), dir.path()).unwrap();
        fs::remove_file(dir.path().join(INDEX_FILE)).unwrap();

        let result = load(dir.path(), Arc::new(HashEmbedding::new(4)));
        assert!(matches!(result, Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn test_load_missing_docstore_is_corrupt() {
        let dir = TempDir::new().unwrap();
        save(&store(), dir.path()).unwrap();
        fs::remove_file(dir.path().join(DOCSTORE_FILE)).unwrap();

        let result = load(dir.path(), Arc::new(HashEmbedding::new(32)));
        assert!(matches!(result, Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn test_save_empty_store_fails() {
        let dir = TempDir::new().unwrap();
        let empty = VectorStore::from_documents(Vec::new(), Arc::new(HashEmbedding::new(4))).unwrap();
        assert!(save(&empty, dir.path()).is_err());
    }
}
