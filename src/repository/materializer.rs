// file: src/repository/materializer.rs
// description: turn a repository working tree into chunk text, source files and extension stats
// reference: scanner + splitter composition

use crate::error::Result;
use crate::models::Document;
use crate::repository::chunker::TextSplitter;
use crate::repository::scanner::FileScanner;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Chunked contents of one repository.
#[derive(Debug, Clone, Default)]
pub struct ProcessedRepository {
    pub chunks: Vec<String>,
    /// Source file of `chunks[i]`, aligned by position.
    pub chunk_files: Vec<String>,
    /// Extension key → number of files contributing chunks.
    pub extension_stats: BTreeMap<String, usize>,
}

impl ProcessedRepository {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Distinct source files that produced at least one chunk.
    pub fn file_count(&self) -> usize {
        self.chunk_files.iter().collect::<BTreeSet<_>>().len()
    }

    /// One document per chunk, with the chunk position as `chunk_id`.
    pub fn documents(&self) -> impl Iterator<Item = Document> + '_ {
        self.chunks
            .iter()
            .zip(&self.chunk_files)
            .enumerate()
            .map(|(i, (chunk, file))| Document::new(chunk.clone(), file.clone(), i))
    }
}

pub fn process(
    root: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<ProcessedRepository> {
    let scanner = FileScanner::new(include_patterns, exclude_patterns)?;
    let splitter = TextSplitter::new(chunk_size, chunk_overlap)?;

    let mut processed = ProcessedRepository::default();

    for file in scanner.scan_directory(root)? {
        let chunks = splitter.split_text(&file.content);
        if chunks.is_empty() {
            continue;
        }

        debug!("{}: {} chunks", file.relative_path, chunks.len());
        *processed
            .extension_stats
            .entry(file.extension_key())
            .or_insert(0) += 1;

        for chunk in chunks {
            processed.chunks.push(chunk);
            processed.chunk_files.push(file.relative_path.clone());
        }
    }

    info!(
        "Processed {} files into {} chunks",
        processed.file_count(),
        processed.chunks.len()
    );
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_process_collects_chunks_and_stats() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("README.md"), "# Project\n\nShort readme.").unwrap();
        fs::write(temp.path().join("src/a.py"), "def a():\n    return 1\n").unwrap();
        fs::write(temp.path().join("src/b.py"), "def b():\n    return 2\n").unwrap();

        let processed = process(temp.path(), &["**/*".to_string()], &[], 1000, 200).unwrap();

        assert_eq!(processed.chunks.len(), 3);
        assert_eq!(processed.file_count(), 3);
        assert_eq!(
            processed.extension_stats,
            BTreeMap::from([(".md".to_string(), 1), (".py".to_string(), 2)])
        );

        let docs: Vec<_> = processed.documents().collect();
        assert_eq!(docs[0].metadata.source, "README.md");
        assert_eq!(docs[2].metadata.chunk_id, 2);
    }

    #[test]
    fn test_duplicate_chunk_text_keeps_both_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("LICENSE"), "MIT License").unwrap();
        fs::create_dir_all(temp.path().join("vendor")).unwrap();
        fs::write(temp.path().join("vendor/LICENSE"), "MIT License").unwrap();

        let processed = process(temp.path(), &["**/*".to_string()], &[], 100, 10).unwrap();

        assert_eq!(processed.chunks, vec!["MIT License", "MIT License"]);
        assert_eq!(processed.chunk_files, vec!["LICENSE", "vendor/LICENSE"]);
        assert_eq!(processed.extension_stats["no_extension"], 2);
    }

    #[test]
    fn test_everything_excluded_is_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "text").unwrap();

        let processed =
            process(temp.path(), &["**/*".to_string()], &["**/*.txt".to_string()], 100, 10)
                .unwrap();
        assert!(processed.is_empty());
        assert_eq!(processed.file_count(), 0);
    }
}
