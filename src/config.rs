// file: src/config.rs
// description: indexer configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{IndexError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_DIR: &str = ".git_repo_research";
pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v2:0";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Root directory holding one bundle directory per repository.
    pub index_dir: PathBuf,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default_config();
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&defaults).map_err(|e| {
                IndexError::Config(format!("Failed to seed defaults: {}", e))
            })?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GIT_REPO_RESEARCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| IndexError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| IndexError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        let index_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_INDEX_DIR);

        Self {
            index: IndexConfig {
                index_dir,
                embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            },
            embedding: EmbeddingConfig {
                api_url: "http://localhost:8080/v1/embeddings".to_string(),
                api_key: None,
                dimension: 1024,
                batch_size: 10,
                timeout_secs: 60,
            },
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.embedding.dimension == 0 {
            return Err(IndexError::Config(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(IndexError::Config(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }

        Validator::validate_url(&self.embedding.api_url)?;

        if self.index.embedding_model.trim().is_empty() {
            return Err(IndexError::Config(
                "index.embedding_model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(IndexError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(IndexError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let excludes = [
            "**/.git/**",
            "**/.github/**",
            "**/.svn/**",
            "**/.hg/**",
            "**/node_modules/**",
            "**/venv/**",
            "**/.venv/**",
            "**/__pycache__/**",
            "**/.pytest_cache/**",
            "**/dist/**",
            "**/build/**",
            "**/target/**",
            "**/.idea/**",
            "**/.vscode/**",
            "**/.DS_Store",
            "**/*.pyc",
            "**/*.so",
            "**/*.dll",
            "**/*.exe",
            "**/*.bin",
            "**/*.o",
            "**/*.a",
            "**/*.dylib",
            "**/*.jpg",
            "**/*.jpeg",
            "**/*.png",
            "**/*.gif",
            "**/*.ico",
            "**/*.mp4",
            "**/*.mp3",
            "**/*.zip",
            "**/*.tar.gz",
            "**/*.tar",
            "**/*.7z",
            "**/*.pdf",
        ];

        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            include_patterns: vec!["**/*".to_string()],
            exclude_patterns: excludes.iter().map(|p| p.to_string()).collect(),
        }
    }
}
