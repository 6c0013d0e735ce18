// file: src/store/chunk_map.rs
// description: position-aligned chunk text and source file record (chunk_map.json)
// reference: https://docs.rs/serde_json

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

pub const CHUNK_MAP_FILE: &str = "chunk_map.json";

/// Chunk texts and the file each came from, aligned by position.
///
/// Identical chunk texts from different files stay distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMap {
    chunks: Vec<String>,
    files: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct ChunkMapFile {
    chunks: Vec<String>,
    chunk_to_file: BTreeMap<String, String>,
}

impl ChunkMap {
    pub fn new(chunks: Vec<String>, files: Vec<String>) -> Result<Self> {
        if chunks.len() != files.len() {
            return Err(IndexError::Validation(format!(
                "{} chunks but {} source files",
                chunks.len(),
                files.len()
            )));
        }
        Ok(Self { chunks, files })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk(&self, position: usize) -> Option<&str> {
        self.chunks.get(position).map(String::as_str)
    }

    pub fn file_for(&self, position: usize) -> Option<&str> {
        self.files.get(position).map(String::as_str)
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.chunks
            .iter()
            .zip(&self.files)
            .map(|(c, f)| (c.as_str(), f.as_str()))
    }

    pub fn save(&self, index_path: &Path) -> Result<()> {
        let path = index_path.join(CHUNK_MAP_FILE);
        let record = ChunkMapFile {
            chunks: self.chunks.clone(),
            chunk_to_file: self
                .files
                .iter()
                .enumerate()
                .map(|(i, f)| (i.to_string(), f.clone()))
                .collect(),
        };
        let contents = serde_json::to_string(&record)?;
        fs::write(&path, contents).map_err(|e| IndexError::file(&path, e))?;
        debug!("Wrote {} chunk entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Read the chunk map of a bundle.
    ///
    /// `Ok(None)` when the file is absent. Malformed JSON, non-numeric or
    /// out-of-range keys and positions without a source file are corrupt.
    pub fn load(index_path: &Path) -> Result<Option<Self>> {
        let path = index_path.join(CHUNK_MAP_FILE);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IndexError::corrupt(&path, e.to_string())),
        };

        let record: ChunkMapFile =
            serde_json::from_str(&contents).map_err(|e| IndexError::corrupt(&path, e.to_string()))?;

        let mut files: Vec<Option<String>> = vec![None; record.chunks.len()];
        for (key, file) in record.chunk_to_file {
            let position = key
                .parse::<usize>()
                .map_err(|_| IndexError::corrupt(&path, format!("invalid chunk key {:?}", key)))?;
            let slot = files.get_mut(position).ok_or_else(|| {
                IndexError::corrupt(
                    &path,
                    format!("chunk key {} exceeds {} chunks", position, record.chunks.len()),
                )
            })?;
            *slot = Some(file);
        }

        let files = files
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                f.ok_or_else(|| IndexError::corrupt(&path, format!("chunk {} has no source file", i)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self {
            chunks: record.chunks,
            files,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_duplicate_text_keeps_both_sources() {
        let dir = TempDir::new().unwrap();
        let map = ChunkMap::new(
            vec!["MIT License".to_string(), "MIT License".to_string()],
            vec!["LICENSE".to_string(), "vendor/LICENSE".to_string()],
        )
        .unwrap();
        map.save(dir.path()).unwrap();

        let loaded = ChunkMap::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.file_for(1), Some("vendor/LICENSE"));
    }

    #[test]
    fn test_on_disk_shape() {
        let dir = TempDir::new().unwrap();
        ChunkMap::new(vec!["a".to_string()], vec!["src/a.py".to_string()])
            .unwrap()
            .save(dir.path())
            .unwrap();

        let raw = fs::read_to_string(dir.path().join(CHUNK_MAP_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["chunks"][0], "a");
        assert_eq!(value["chunk_to_file"]["0"], "src/a.py");
    }

    #[test]
    fn test_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ChunkMap::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_variants() {
        let cases = [
            "not json",
            r#"{"chunks": ["a"], "chunk_to_file": {"x": "f"}}"#,
            r#"{"chunks": ["a"], "chunk_to_file": {"3": "f"}}"#,
            r#"{"chunks": ["a", "b"], "chunk_to_file": {"0": "f"}}"#,
        ];
        for case in cases {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join(CHUNK_MAP_FILE), case).unwrap();
            assert!(
                matches!(ChunkMap::load(dir.path()), Err(IndexError::Corrupt { .. })),
                "expected corrupt for {}",
                case
            );
        }
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        assert!(ChunkMap::new(vec!["a".to_string()], Vec::new()).is_err());
    }
}
