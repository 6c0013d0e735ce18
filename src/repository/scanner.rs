// file: src/repository/scanner.rs
// description: Directory walking and text file discovery with glob filtering
// reference: https://docs.rs/walkdir

use crate::error::{IndexError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub struct FileScanner {
    include: GlobSet,
    exclude: GlobSet,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
    pub content: String,
}

impl ScannedFile {
    /// Extension statistics key: `.ext`, or `no_extension`.
    pub fn extension_key(&self) -> String {
        Path::new(&self.relative_path)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_else(|| "no_extension".to_string())
    }
}

impl FileScanner {
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_globset(include_patterns)?,
            exclude: build_globset(exclude_patterns)?,
        })
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        info!("Scanning directory: {}", root.display());

        if !root.is_dir() {
            return Err(IndexError::Validation(format!(
                "Repository path is not a directory: {}",
                root.display()
            )));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error walking {}: {}", root.display(), e);
                    continue;
                }
            };

            // Symlinked files are read through their target, the same way the
            // snapshot copy does. Symlinked directories are not descended.
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let path = entry.path();
            let relative_path = relative_path(root, path);

            if !self.matches(&relative_path) {
                debug!("Skipping file: {}", relative_path);
                continue;
            }

            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("Skipping unreadable file {}: {}", path.display(), e);
                    continue;
                }
            };

            if bytes.contains(&0) {
                debug!("Skipping binary file: {}", relative_path);
                continue;
            }

            let content = match String::from_utf8(bytes) {
                Ok(content) => content,
                Err(_) => {
                    debug!("Skipping non UTF-8 file: {}", relative_path);
                    continue;
                }
            };

            if content.trim().is_empty() {
                continue;
            }

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path,
                content,
            });
        }

        info!("Found {} text files", files.len());
        Ok(files)
    }

    fn matches(&self, relative_path: &str) -> bool {
        self.include.is_match(relative_path) && !self.exclude.is_match(relative_path)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            IndexError::Validation(format!("Invalid glob pattern {:?}: {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| IndexError::Validation(format!("Failed to build glob set: {}", e)))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn all() -> Vec<String> {
        vec!["**/*".to_string()]
    }

    #[test]
    fn test_scan_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        fs::write(temp.path().join("README.md"), "# Test").unwrap();
        fs::write(temp.path().join("src/nested/a.py"), "print('a')").unwrap();

        let scanner = FileScanner::new(&all(), &[]).unwrap();
        let files = scanner.scan_directory(temp.path()).unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/nested/a.py"]);
    }

    #[test]
    fn test_skips_git_binary_and_empty_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".git/config"), "[core]").unwrap();
        fs::write(temp.path().join("image.dat"), [0x89u8, 0x00, 0x01]).unwrap();
        fs::write(temp.path().join("latin1.txt"), [0xe9u8, 0x74, 0xe9]).unwrap();
        fs::write(temp.path().join("blank.txt"), "   \n").unwrap();
        fs::write(temp.path().join("main.rs"), "fn main() {}").unwrap();

        let scanner = FileScanner::new(&all(), &[]).unwrap();
        let files = scanner.scan_directory(temp.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "main.rs");
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("node_modules/pkg")).unwrap();
        fs::write(temp.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(temp.path().join("app.js"), "y").unwrap();
        fs::write(temp.path().join("notes.md"), "z").unwrap();

        let scanner = FileScanner::new(
            &["**/*.js".to_string()],
            &["**/node_modules/**".to_string()],
        )
        .unwrap();
        let files = scanner.scan_directory(temp.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "app.js");
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_symlinked_files_but_not_directories() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::create_dir_all(outside.path().join("vendored")).unwrap();
        fs::write(outside.path().join("vendored/lib.rs"), "pub fn lib() {}").unwrap();
        fs::write(temp.path().join("shared.md"), "# Shared notes").unwrap();
        symlink(temp.path().join("shared.md"), temp.path().join("alias.md")).unwrap();
        symlink(outside.path().join("vendored"), temp.path().join("vendored")).unwrap();
        symlink(temp.path().join("missing.md"), temp.path().join("broken.md")).unwrap();

        let scanner = FileScanner::new(&all(), &[]).unwrap();
        let files = scanner.scan_directory(temp.path()).unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["alias.md", "shared.md"]);
        assert_eq!(files[0].content, "# Shared notes");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "hidden").unwrap();
        fs::write(temp.path().join("open.txt"), "visible").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // privileged users read through mode bits
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let scanner = FileScanner::new(&all(), &[]).unwrap();
        let result = scanner.scan_directory(temp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let files = result.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "open.txt");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(FileScanner::new(&["[unclosed".to_string()], &[]).is_err());
    }

    #[test]
    fn test_extension_key() {
        let file = |p: &str| ScannedFile {
            path: PathBuf::from(p),
            relative_path: p.to_string(),
            content: String::new(),
        };
        assert_eq!(file("src/a.PY").extension_key(), ".py");
        assert_eq!(file("Makefile").extension_key(), "no_extension");
    }
}
