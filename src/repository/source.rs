// file: src/repository/source.rs
// description: repository source resolution: url detection, cloning, naming and HEAD lookup
// reference: https://docs.rs/gix

use crate::error::{IndexError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

lazy_static! {
    static ref REMOTE_URL: Regex = Regex::new(
        r"^(?:https?|ssh|git)://[^\s/]+/\S+$"
    ).expect("REMOTE_URL regex is valid");

    // user@host:owner/repo
    static ref SCP_URL: Regex = Regex::new(
        r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:[^\s/]\S*$"
    ).expect("SCP_URL regex is valid");
}

pub fn is_git_url(source: &str) -> bool {
    let source = source.trim();
    REMOTE_URL.is_match(source) || SCP_URL.is_match(source)
}

pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Human-readable repository name.
///
/// URLs become `owner_repo` from their last two path segments with any `.git`
/// suffix dropped; local paths use their final component.
pub fn repository_name(source: &str) -> String {
    let trimmed = source.trim().trim_end_matches('/');

    if is_git_url(trimmed) {
        let path_part = match trimmed.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
            None => trimmed.split_once(':').map(|(_, p)| p).unwrap_or(""),
        };

        let segments: Vec<&str> = path_part
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.strip_suffix(".git").unwrap_or(s))
            .collect();

        return match segments.as_slice() {
            [] => "repository".to_string(),
            [only] => only.to_string(),
            [.., owner, repo] => format!("{}_{}", owner, repo),
        };
    }

    let path = Path::new(trimmed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .or_else(|| {
            fs::canonicalize(path)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        });

    name.unwrap_or_else(|| "repository".to_string())
}

/// Directory-safe form of a repository name: anything other than ASCII
/// alphanumerics, `-` and `_` becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// HEAD commit of the repository at `path`, if it has one.
pub fn head_commit_id(path: &Path) -> Option<String> {
    if !is_git_repo(path) {
        debug!(".git directory not found at {}", path.display());
        return None;
    }

    let repo = match gix::open(path) {
        Ok(repo) => repo,
        Err(e) => {
            warn!("Error opening git repository {}: {}", path.display(), e);
            return None;
        }
    };

    match repo.head_id() {
        Ok(id) => Some(id.to_string()),
        Err(e) => {
            warn!("Repository {} has no readable HEAD commit: {}", path.display(), e);
            None
        }
    }
}

/// A clone in a temporary directory, removed when dropped.
#[derive(Debug)]
pub struct ClonedRepository {
    path: PathBuf,
}

impl ClonedRepository {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cleanup(self) {
        // drop does the work
    }
}

impl Drop for ClonedRepository {
    fn drop(&mut self) {
        if self.path.exists() {
            match fs::remove_dir_all(&self.path) {
                Ok(()) => debug!("Removed temporary clone {}", self.path.display()),
                Err(e) => warn!(
                    "Failed to remove temporary clone {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

/// Clone `url` into a fresh directory under the system temp dir.
pub fn clone_repository(url: &str) -> Result<ClonedRepository> {
    let dest = std::env::temp_dir().join(format!("git-repo-research-{}", Uuid::new_v4()));
    fs::create_dir_all(&dest).map_err(|e| IndexError::file(&dest, e))?;

    // guard first so a failed clone still cleans up
    let cloned = ClonedRepository { path: dest };

    info!("Cloning repository from {}", url);

    let mut prepare = gix::prepare_clone(url, cloned.path())
        .map_err(|e| IndexError::Acquisition(format!("Clone setup failed: {}", e)))?;

    let (mut checkout, _) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| IndexError::Acquisition(format!("Fetch failed: {}", e)))?;

    checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| IndexError::Acquisition(format!("Checkout failed: {}", e)))?;

    info!("Repository cloned to {}", cloned.path().display());
    Ok(cloned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_git_url() {
        assert!(is_git_url("https://github.com/awslabs/mcp"));
        assert!(is_git_url("https://github.com/awslabs/mcp.git"));
        assert!(is_git_url("git@github.com:awslabs/mcp.git"));
        assert!(is_git_url("ssh://git@github.com/awslabs/mcp"));
        assert!(!is_git_url("/home/user/projects/mcp"));
        assert!(!is_git_url("./relative/path"));
        assert!(!is_git_url("C:/projects/mcp"));
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(repository_name("https://github.com/awslabs/mcp"), "awslabs_mcp");
        assert_eq!(repository_name("https://github.com/awslabs/mcp.git/"), "awslabs_mcp");
        assert_eq!(repository_name("git@github.com:owner/tool.git"), "owner_tool");
        assert_eq!(repository_name("/home/user/projects/my-repo"), "my-repo");
        assert_eq!(repository_name("/home/user/projects/my-repo/"), "my-repo");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("awslabs_mcp"), "awslabs_mcp");
        assert_eq!(sanitize_name("my repo.v2"), "my_repo_v2");
        assert_eq!(sanitize_name("a/b:c"), "a_b_c");
    }

    #[test]
    fn test_head_commit_without_git_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(!is_git_repo(temp.path()));
        assert!(head_commit_id(temp.path()).is_none());
    }

    #[test]
    fn test_cloned_repository_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clone");
        fs::create_dir_all(path.join("src")).unwrap();
        fs::write(path.join("src/lib.rs"), "fn main() {}").unwrap();

        let cloned = ClonedRepository { path: path.clone() };
        cloned.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_clone_failure_leaves_no_temp_dir() {
        let before: Vec<_> = fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();

        let result = clone_repository("file:///definitely/not/a/repository");
        assert!(matches!(result, Err(IndexError::Acquisition(_))));

        let leaked = fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .filter(|name| !before.contains(name))
            .any(|name| name.to_string_lossy().starts_with("git-repo-research-"));
        assert!(!leaked);
    }
}
