// file: src/repository/snapshot.rs
// description: copy a repository working tree into an index bundle and measure directories
// reference: https://docs.rs/walkdir

use crate::error::{IndexError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files_copied: usize,
    pub files_failed: usize,
}

/// Copy every file under `source` into `target`, skipping `.git`.
///
/// `target` is removed first if it exists. Directory structure, including empty
/// directories, is recreated. A file that fails to copy is logged and counted
/// but does not abort the copy.
pub fn copy_repository_tree(source: &Path, target: &Path) -> Result<CopyStats> {
    if target.exists() {
        fs::remove_dir_all(target).map_err(|e| IndexError::file(target, e))?;
    }
    fs::create_dir_all(target).map_err(|e| IndexError::file(target, e))?;

    info!("Copying all files from {} to {}", source.display(), target.display());

    let mut stats = CopyStats::default();

    for entry in WalkDir::new(source)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error walking {}: {}", source.display(), e);
                stats.files_failed += 1;
                continue;
            }
        };

        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(&destination) {
                warn!("Error creating directory {}: {}", destination.display(), e);
            }
            continue;
        }

        match fs::copy(entry.path(), &destination) {
            Ok(_) => stats.files_copied += 1,
            Err(e) => {
                warn!("Error copying file {}: {}", entry.path().display(), e);
                stats.files_failed += 1;
            }
        }
    }

    info!(
        "Copied {} files to {} ({} failed)",
        stats.files_copied,
        target.display(),
        stats.files_failed
    );
    Ok(stats)
}

/// Total size in bytes of the regular files under `path`.
pub fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| {
            IndexError::Validation(format!("Failed to walk {}: {}", path.display(), e))
        })?;
        if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(|e| {
                IndexError::Validation(format!("Failed to stat {}: {}", entry.path().display(), e))
            })?;
            total += metadata.len();
        }
    }
    debug!("{} holds {} bytes", path.display(), total);
    Ok(total)
}

/// Log every file under `path` with its size.
pub fn log_directory_listing(path: &Path) {
    info!("Files in {}:", path.display());
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            info!("  {} ({} bytes)", entry.path().display(), size);
        }
    }
}
