// file: src/models/response.rs
// description: structured result returned by repository indexing
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRepositoryResponse {
    pub status: Status,
    pub repository_name: String,
    pub repository_path: String,
    pub index_path: String,
    pub repository_directory: Option<String>,
    pub file_count: usize,
    pub chunk_count: usize,
    pub embedding_model: String,
    pub execution_time_ms: u64,
    pub message: String,
}

impl IndexRepositoryResponse {
    /// An error result with empty counts and no index path.
    pub fn error(
        repository_name: impl Into<String>,
        repository_path: impl Into<String>,
        embedding_model: impl Into<String>,
        execution_time_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: Status::Error,
            repository_name: repository_name.into(),
            repository_path: repository_path.into(),
            index_path: String::new(),
            repository_directory: None,
            file_count: 0,
            chunk_count: 0,
            embedding_model: embedding_model.into(),
            execution_time_ms,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let response = IndexRepositoryResponse::error("repo", "/tmp/repo", "model", 12, "boom");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["index_path"], "");
        assert!(value["repository_directory"].is_null());
        assert!(!response.is_success());
    }
}
