// file: src/utils/validation.rs
// description: input validation for repository sources and search parameters
// reference: input validation patterns

use crate::error::{IndexError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(IndexError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(IndexError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(IndexError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_repository_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(IndexError::Validation(
                "Repository name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_search_params(limit: usize, threshold: f32) -> Result<()> {
        if limit == 0 {
            return Err(IndexError::Validation(
                "Search limit must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&threshold) {
            return Err(IndexError::Validation(format!(
                "Search threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent")).is_err());

        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(Validator::validate_directory(&file).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://example.com").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_repository_name() {
        assert!(Validator::validate_repository_name("awslabs_mcp").is_ok());
        assert!(Validator::validate_repository_name("  ").is_err());
    }

    #[test]
    fn test_validate_search_params() {
        assert!(Validator::validate_search_params(10, 0.0).is_ok());
        assert!(Validator::validate_search_params(0, 0.5).is_err());
        assert!(Validator::validate_search_params(5, 1.5).is_err());
    }
}
