// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod chunker;
pub mod materializer;
pub mod scanner;
pub mod snapshot;
pub mod source;

pub use chunker::TextSplitter;
pub use materializer::{ProcessedRepository, process};
pub use scanner::{FileScanner, ScannedFile};
pub use snapshot::{CopyStats, copy_repository_tree, dir_size};
pub use source::{
    ClonedRepository, clone_repository, head_commit_id, is_git_repo, is_git_url,
    repository_name, sanitize_name,
};
