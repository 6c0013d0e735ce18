// file: src/models/metadata.rs
// description: persisted index metadata record and its metadata.json codec
// reference: https://docs.rs/serde_json

use crate::error::{IndexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub const METADATA_FILE: &str = "metadata.json";
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Provenance and statistics of one persisted repository index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub repository_name: String,
    pub repository_path: String,
    pub index_path: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub file_count: usize,
    pub chunk_count: usize,
    pub embedding_model: String,
    pub file_types: BTreeMap<String, usize>,
    pub total_tokens: Option<u64>,
    pub index_size_bytes: u64,
    #[serde(default = "unknown_commit")]
    pub last_commit_id: String,
    pub repository_directory: String,
}

fn unknown_commit() -> String {
    UNKNOWN_COMMIT.to_string()
}

impl IndexMetadata {
    /// Read `metadata.json` from a bundle directory.
    ///
    /// `Ok(None)` means the file does not exist; an unreadable or malformed file
    /// is reported as [`IndexError::Corrupt`].
    pub fn read(index_path: &Path) -> Result<Option<Self>> {
        let path = index_path.join(METADATA_FILE);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No metadata file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(IndexError::corrupt(&path, e.to_string())),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| IndexError::corrupt(&path, e.to_string()))
    }

    /// Replace `metadata.json` atomically: readers see either the old record
    /// or the new one, never a truncated file.
    pub fn write(&self, index_path: &Path) -> Result<()> {
        let path = index_path.join(METADATA_FILE);
        let temp_path = index_path.join(format!(".{}.tmp-{}", METADATA_FILE, Uuid::new_v4()));
        let contents = serde_json::to_string_pretty(self)?;

        {
            let mut file = File::create(&temp_path).map_err(|e| IndexError::file(&temp_path, e))?;
            file.write_all(contents.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| {
                    let _ = fs::remove_file(&temp_path);
                    IndexError::file(&temp_path, e)
                })?;
        }

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(IndexError::file(&path, e));
        }
        debug!("Wrote metadata for {} to {}", self.repository_name, path.display());
        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_accessed = Some(Utc::now());
    }
}
