// file: src/indexer/manager.rs
// description: builds, locates, loads, searches and deletes persisted repository indices
// reference: staged directory build with verify-then-rename promotion

use crate::config::{ChunkingConfig, IndexConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{IndexError, Result};
use crate::models::metadata::{METADATA_FILE, UNKNOWN_COMMIT};
use crate::models::{Document, IndexMetadata, IndexRepositoryResponse, SearchResult, Status};
use crate::pipeline::ProgressSink;
use crate::repository::snapshot::log_directory_listing;
use crate::repository::{
    ClonedRepository, ProcessedRepository, clone_repository, copy_repository_tree, dir_size,
    head_commit_id, is_git_repo, is_git_url, process, repository_name, sanitize_name,
};
use crate::store::{
    CHUNK_MAP_FILE, ChunkMap, DOCSTORE_FILE, INDEX_FILE, MAPPING_FILE, VectorStore, codec,
};
use crate::utils::{OperationTimer, Validator};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const REPOSITORY_DIR: &str = "repository";

const SLOW_EMBEDDING: Duration = Duration::from_secs(300);

/// Files whose presence marks a directory as a (possibly damaged) bundle.
const BUNDLE_FILES: [&str; 4] = [METADATA_FILE, DOCSTORE_FILE, MAPPING_FILE, CHUNK_MAP_FILE];

/// Parameters of one `index_repository` call. Unset options fall back to the
/// indexer's [`ChunkingConfig`].
#[derive(Debug, Clone)]
pub struct IndexRequest {
    /// Local directory or remote git URL.
    pub repository_path: String,
    /// Bundle directory; defaults to `<index_dir>/<sanitized name>`.
    pub output_path: Option<PathBuf>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

impl IndexRequest {
    pub fn new(repository_path: impl Into<String>) -> Self {
        Self {
            repository_path: repository_path.into(),
            output_path: None,
            include_patterns: None,
            exclude_patterns: None,
            chunk_size: None,
            chunk_overlap: None,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = Some(patterns);
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = Some(patterns);
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self.chunk_overlap = Some(chunk_overlap);
        self
    }
}

/// A restored index bundle.
#[derive(Debug)]
pub struct LoadedIndex {
    pub vector_store: VectorStore,
    pub chunk_map: ChunkMap,
    /// Metadata after the access-time update, when it could be read.
    pub metadata: Option<IndexMetadata>,
}

pub struct RepositoryIndexer {
    index_dir: PathBuf,
    embedding_model: String,
    chunking: ChunkingConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
}

/// Per-call state whose drop releases the temporary clone.
#[derive(Default)]
struct Attempt {
    clone: Option<ClonedRepository>,
    source_dir: Option<PathBuf>,
}

/// Bundle under construction, next to its final location. Removed on drop
/// unless promoted.
struct StagingDir {
    path: PathBuf,
    promoted: bool,
}

impl StagingDir {
    fn create(index_path: &Path) -> Result<Self> {
        let parent = index_path.parent().ok_or_else(|| {
            IndexError::Validation(format!("Index path has no parent: {}", index_path.display()))
        })?;
        fs::create_dir_all(parent).map_err(|e| IndexError::file(parent, e))?;

        let base = index_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "index".to_string());
        let path = parent.join(format!(".{}.staging-{}", base, Uuid::new_v4()));
        fs::create_dir_all(&path).map_err(|e| IndexError::file(&path, e))?;
        debug!("Staging bundle in {}", path.display());

        Ok(Self {
            path,
            promoted: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Replace whatever is at `target` with the staged bundle.
    fn promote(mut self, target: &Path) -> Result<()> {
        if target.exists() {
            fs::remove_dir_all(target).map_err(|e| IndexError::file(target, e))?;
        }
        fs::rename(&self.path, target).map_err(|e| IndexError::file(target, e))?;
        self.promoted = true;
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.promoted && self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("Failed to remove staging directory {}: {}", self.path.display(), e);
            }
        }
    }
}

fn report(progress: Option<&dyn ProgressSink>, current: u64, message: Option<&str>) {
    if let Some(sink) = progress {
        if let Some(message) = message {
            sink.info(message);
        }
        sink.report_progress(current, 100);
    }
}

impl RepositoryIndexer {
    pub fn new(
        index: IndexConfig,
        chunking: ChunkingConfig,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        chunking.validate()?;
        fs::create_dir_all(&index.index_dir).map_err(|e| IndexError::file(&index.index_dir, e))?;

        info!(
            "Repository indexer using {} (model {})",
            index.index_dir.display(),
            index.embedding_model
        );

        Ok(Self {
            index_dir: index.index_dir,
            embedding_model: index.embedding_model,
            chunking,
            embeddings,
        })
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Bundle directory for a repository name.
    pub fn index_path(&self, repository_name: &str) -> PathBuf {
        self.index_dir.join(sanitize_name(repository_name))
    }

    /// Build and persist an index for `request.repository_path`.
    ///
    /// Never fails: every error becomes a response with `status = error`.
    /// A temporary clone is always removed before returning.
    pub fn index_repository(
        &self,
        request: &IndexRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> IndexRepositoryResponse {
        let mut timer = OperationTimer::new("index_repository");
        let mut attempt = Attempt::default();

        let response = match self.build_index(request, progress, &mut timer, &mut attempt) {
            Ok(response) => response,
            Err(e) => {
                let message = format!("Error indexing repository: {}", e);
                error!("{}", message);
                if let Some(sink) = progress {
                    sink.error(&message);
                    sink.report_progress(100, 100);
                }

                let mut response = IndexRepositoryResponse::error(
                    repository_name(&request.repository_path),
                    request.repository_path.clone(),
                    self.embedding_model.clone(),
                    timer.elapsed_ms(),
                    message,
                );
                response.repository_directory = attempt
                    .source_dir
                    .as_ref()
                    .map(|p| p.display().to_string());
                response
            }
        };

        if let Some(clone) = attempt.clone.take() {
            clone.cleanup();
        }
        response
    }

    fn build_index(
        &self,
        request: &IndexRequest,
        progress: Option<&dyn ProgressSink>,
        timer: &mut OperationTimer,
        attempt: &mut Attempt,
    ) -> Result<IndexRepositoryResponse> {
        let source = request.repository_path.as_str();

        let repo_path = if is_git_url(source) {
            report(progress, 0, Some(&format!("Cloning repository from {}", source)));
            let clone = clone_repository(source)?;
            let path = clone.path().to_path_buf();
            attempt.clone = Some(clone);
            path
        } else {
            let path = PathBuf::from(source);
            Validator::validate_directory(&path)?;
            path
        };
        attempt.source_dir = Some(repo_path.clone());
        timer.stage("acquire");

        let name = repository_name(source);
        Validator::validate_repository_name(&name)?;
        info!("Indexing repository: {}", name);
        report(progress, 0, Some(&format!("Indexing repository: {}", name)));

        report(progress, 10, Some("Processing repository files..."));
        let processed = process(
            &repo_path,
            request
                .include_patterns
                .as_deref()
                .unwrap_or(&self.chunking.include_patterns),
            request
                .exclude_patterns
                .as_deref()
                .unwrap_or(&self.chunking.exclude_patterns),
            request.chunk_size.unwrap_or(self.chunking.chunk_size),
            request.chunk_overlap.unwrap_or(self.chunking.chunk_overlap),
        )?;
        report(progress, 30, None);
        timer.stage("chunk");

        if processed.is_empty() {
            warn!("No text chunks found in repository");
            report(progress, 100, Some("No text chunks found in repository"));
            let mut response = IndexRepositoryResponse::error(
                name,
                source,
                self.embedding_model.clone(),
                timer.elapsed_ms(),
                "No text chunks found in repository",
            );
            response.repository_directory = Some(repo_path.display().to_string());
            return Ok(response);
        }

        report(
            progress,
            40,
            Some(&format!(
                "Converting {} chunks to Document objects...",
                processed.chunks.len()
            )),
        );
        let documents = documents_with_progress(&processed, progress);

        let index_path = match &request.output_path {
            Some(path) => path.clone(),
            None => self.index_path(&name),
        };
        self.warn_on_name_collision(&index_path, &name);

        let staging = StagingDir::create(&index_path)?;

        report(progress, 60, Some("Copying repository files..."));
        copy_repository_tree(&repo_path, &staging.path().join(REPOSITORY_DIR))?;
        timer.stage("copy");

        report(progress, 70, Some("Creating vector index..."));
        report(
            progress,
            75,
            Some("Generating embeddings and creating vector store..."),
        );
        let store = VectorStore::from_documents(documents, self.embeddings.clone())?;
        timer.stage("embed");
        timer.warn_if_slow(SLOW_EMBEDDING);

        report(progress, 85, Some(&format!("Saving index to {}", index_path.display())));
        codec::save(&store, staging.path())?;
        self.verify_saved(&store, staging.path())?;

        let chunk_map = ChunkMap::new(processed.chunks.clone(), processed.chunk_files.clone())?;
        chunk_map.save(staging.path())?;

        let index_size_bytes = dir_size(staging.path())?;

        let last_commit_id = if is_git_url(source) || is_git_repo(&repo_path) {
            info!("Attempting to get last commit ID for {}", name);
            head_commit_id(&repo_path).unwrap_or_else(|| UNKNOWN_COMMIT.to_string())
        } else {
            UNKNOWN_COMMIT.to_string()
        };
        debug!("Using commit ID {}", last_commit_id);

        report(progress, 90, Some("Finalizing index metadata..."));
        let repository_directory = index_path.join(REPOSITORY_DIR);
        let metadata = IndexMetadata {
            repository_name: name.clone(),
            repository_path: source.to_string(),
            index_path: index_path.display().to_string(),
            created_at: Utc::now(),
            last_accessed: None,
            file_count: processed.file_count(),
            chunk_count: processed.chunks.len(),
            embedding_model: self.embedding_model.clone(),
            file_types: processed.extension_stats.clone(),
            total_tokens: None,
            index_size_bytes,
            last_commit_id,
            repository_directory: repository_directory.display().to_string(),
        };
        metadata.write(staging.path())?;

        staging.promote(&index_path)?;
        timer.stage("persist");

        let execution_time_ms = timer.elapsed_ms();
        info!(
            "Indexing completed in {}ms ({})",
            execution_time_ms,
            timer.summary()
        );
        report(
            progress,
            100,
            Some(&format!("Indexing completed in {}ms", execution_time_ms)),
        );

        Ok(IndexRepositoryResponse {
            status: Status::Success,
            repository_name: name,
            repository_path: source.to_string(),
            index_path: metadata.index_path.clone(),
            repository_directory: Some(metadata.repository_directory.clone()),
            file_count: metadata.file_count,
            chunk_count: metadata.chunk_count,
            embedding_model: self.embedding_model.clone(),
            execution_time_ms,
            message: format!(
                "Successfully indexed repository with {} files and {} chunks",
                metadata.file_count, metadata.chunk_count
            ),
        })
    }

    /// Reload what was just written and compare it with the in-memory store.
    fn verify_saved(&self, store: &VectorStore, dir: &Path) -> Result<()> {
        let reloaded = codec::load(dir, self.embeddings.clone())?
            .ok_or_else(|| IndexError::Verification("saved index file is missing".to_string()))?;

        if reloaded.len() != store.len() {
            return Err(IndexError::Verification(format!(
                "saved index has {} documents, expected {}",
                reloaded.len(),
                store.len()
            )));
        }
        if reloaded.index().len() != store.index().len() {
            return Err(IndexError::Verification(format!(
                "saved index has {} vectors, expected {}",
                reloaded.index().len(),
                store.index().len()
            )));
        }
        if reloaded.index_to_docstore_id() != store.index_to_docstore_id() {
            return Err(IndexError::Verification(
                "saved position mapping differs from the built one".to_string(),
            ));
        }

        info!("Verified saved index with {} documents", reloaded.len());
        Ok(())
    }

    fn warn_on_name_collision(&self, index_path: &Path, name: &str) {
        match IndexMetadata::read(index_path) {
            Ok(Some(existing)) if existing.repository_name != name => warn!(
                "Index directory {} belongs to repository {} and will be replaced by {}",
                index_path.display(),
                existing.repository_name,
                name
            ),
            Ok(_) => {}
            Err(e) => warn!("Existing index at {} is unreadable: {}", index_path.display(), e),
        }
    }

    pub fn get_index_metadata(&self, repository_name: &str) -> Result<Option<IndexMetadata>> {
        IndexMetadata::read(&self.index_path(repository_name))
    }

    /// Names of all repositories with a readable bundle, sorted.
    pub fn list_indexed_repositories(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.index_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IndexError::file(&self.index_dir, e)),
        };

        let mut repositories = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IndexError::file(&self.index_dir, e))?;
            let path = entry.path();

            // staging directories are dot-prefixed
            if !path.is_dir() || entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            match IndexMetadata::read(&path) {
                Ok(Some(metadata)) => repositories.push(metadata.repository_name),
                Ok(None) => {}
                Err(e) => warn!("Error reading metadata file {}: {}", path.join(METADATA_FILE).display(), e),
            }
        }

        repositories.sort();
        Ok(repositories)
    }

    /// Restore the vector store and chunk map of `repository_name`.
    ///
    /// `Ok(None)` when no bundle exists. A bundle missing its chunk map, or with
    /// any unreadable part, is [`IndexError::Corrupt`]. A successful load records
    /// the access time in `metadata.json`; failing to do so is only logged.
    pub fn load_index(&self, repository_name: &str) -> Result<Option<LoadedIndex>> {
        let index_path = self.index_path(repository_name);
        info!("Loading index from {}", index_path.display());

        if !index_path.is_dir() {
            error!("Index directory not found: {}", index_path.display());
            return Ok(None);
        }
        if !index_path.join(INDEX_FILE).exists() {
            let leftovers: Vec<&str> = BUNDLE_FILES
                .iter()
                .copied()
                .filter(|file| index_path.join(file).exists())
                .collect();
            if leftovers.is_empty() {
                error!("Vector index file not found in {}", index_path.display());
                return Ok(None);
            }

            error!(
                "Vector index file missing from bundle {} (found {})",
                index_path.display(),
                leftovers.join(", ")
            );
            log_directory_listing(&index_path);
            return Err(IndexError::corrupt(
                index_path.join(INDEX_FILE),
                "vector index is missing from an existing bundle",
            ));
        }

        let vector_store = match codec::load(&index_path, self.embeddings.clone()) {
            Ok(Some(store)) => store,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!("Error loading vector index: {}", e);
                log_directory_listing(&index_path);
                return Err(e);
            }
        };
        info!(
            "Successfully loaded vector store with {} documents",
            vector_store.len()
        );

        let chunk_map = match ChunkMap::load(&index_path) {
            Ok(Some(chunk_map)) => chunk_map,
            Ok(None) => {
                let path = index_path.join(CHUNK_MAP_FILE);
                error!("Chunk map not found: {}", path.display());
                return Err(IndexError::corrupt(path, "chunk map is missing"));
            }
            Err(e) => {
                error!("Failed to load chunk map: {}", e);
                return Err(e);
            }
        };
        info!("Successfully loaded chunk map with {} chunks", chunk_map.len());

        if chunk_map.len() != vector_store.len() {
            return Err(IndexError::corrupt(
                index_path.join(CHUNK_MAP_FILE),
                format!(
                    "chunk map has {} chunks but the vector store holds {} documents",
                    chunk_map.len(),
                    vector_store.len()
                ),
            ));
        }
        if let Ok(Some(recorded)) = IndexMetadata::read(&index_path) {
            if recorded.chunk_count != chunk_map.len() {
                return Err(IndexError::corrupt(
                    index_path.join(CHUNK_MAP_FILE),
                    format!(
                        "chunk map has {} chunks but metadata records {}",
                        chunk_map.len(),
                        recorded.chunk_count
                    ),
                ));
            }
        }

        let metadata = self.touch_metadata(&index_path, repository_name);

        Ok(Some(LoadedIndex {
            vector_store,
            chunk_map,
            metadata,
        }))
    }

    fn touch_metadata(&self, index_path: &Path, repository_name: &str) -> Option<IndexMetadata> {
        match IndexMetadata::read(index_path) {
            Ok(Some(mut metadata)) => {
                metadata.touch();
                if let Err(e) = metadata.write(index_path) {
                    warn!(
                        "Error updating metadata for repository {}: {}",
                        repository_name, e
                    );
                }
                Some(metadata)
            }
            Ok(None) => {
                warn!("No metadata to update for repository {}", repository_name);
                None
            }
            Err(e) => {
                warn!(
                    "Error updating metadata for repository {}: {}",
                    repository_name, e
                );
                None
            }
        }
    }

    /// Remove the bundle of `repository_name`. `Ok(false)` if there was none.
    pub fn delete_index(&self, repository_name: &str) -> Result<bool> {
        let index_path = self.index_path(repository_name);
        if !index_path.exists() {
            debug!("Nothing to delete at {}", index_path.display());
            return Ok(false);
        }

        fs::remove_dir_all(&index_path).map_err(|e| IndexError::file(&index_path, e))?;
        info!("Deleted index {}", index_path.display());
        Ok(true)
    }

    /// Search one repository's index.
    ///
    /// `Ok(None)` when the repository is not indexed. Hits whose score is below
    /// `threshold` are dropped.
    pub fn search(
        &self,
        repository_name: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Option<Vec<SearchResult>>> {
        Validator::validate_search_params(limit, threshold)?;
        let timer = OperationTimer::new("search");

        let Some(loaded) = self.load_index(repository_name)? else {
            return Ok(None);
        };

        let display_name = loaded
            .metadata
            .as_ref()
            .map(|m| m.repository_name.clone())
            .unwrap_or_else(|| repository_name.to_string());

        let results: Vec<SearchResult> = loaded
            .vector_store
            .similarity_search_with_score(query, limit)?
            .into_iter()
            .map(|(doc, distance)| SearchResult::from_hit(&display_name, doc, distance))
            .filter(|r| r.score >= threshold)
            .collect();

        timer.finish_with_count(results.len());
        Ok(Some(results))
    }
}

fn documents_with_progress(
    processed: &ProcessedRepository,
    progress: Option<&dyn ProgressSink>,
) -> Vec<Document> {
    let total = processed.chunks.len();
    let step = (total / 10).max(1);

    processed
        .documents()
        .enumerate()
        .map(|(i, doc)| {
            if i % step == 0 {
                report(progress, 40 + (i * 20 / total) as u64, None);
            }
            doc
        })
        .collect()
}
