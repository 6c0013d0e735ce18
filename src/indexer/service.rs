// file: src/indexer/service.rs
// description: async facade running the blocking indexer on the tokio blocking pool
// reference: https://docs.rs/tokio/latest/tokio/task/fn.spawn_blocking.html

use super::manager::{IndexRequest, LoadedIndex, RepositoryIndexer};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, HttpEmbeddingClient};
use crate::error::{IndexError, Result};
use crate::models::{IndexMetadata, IndexRepositoryResponse, SearchResult};
use crate::pipeline::ProgressSink;
use crate::repository::repository_name;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

/// Shares one [`RepositoryIndexer`] between async callers.
///
/// Operations that write to a bundle directory (build, delete, and loads, which
/// record the access time) are serialised per directory within this process.
/// A directory's lock is tracked only while some call holds or awaits it.
pub struct IndexService {
    indexer: Arc<RepositoryIndexer>,
    locks: LockTable,
}

type LockTable = Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>;

/// Holds one bundle lock and forgets the table entry once nobody else wants it.
struct BundleGuard<'a> {
    locks: &'a LockTable,
    bundle: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BundleGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(&self.bundle)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.bundle);
        }
    }
}

async fn run_blocking<T, F>(operation: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IndexError::Task(format!("{} task failed: {}", operation, e)))
}

impl IndexService {
    pub fn new(indexer: RepositoryIndexer) -> Self {
        Self {
            indexer: Arc::new(indexer),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Service backed by the HTTP embedding endpoint named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingClient::new(
            &config.embedding,
            config.index.embedding_model.clone(),
        )?);

        let indexer = RepositoryIndexer::new(
            config.index.clone(),
            config.chunking.clone(),
            embeddings,
        )?;
        info!("Index service ready at {}", indexer.index_dir().display());
        Ok(Self::new(indexer))
    }

    pub fn indexer(&self) -> &RepositoryIndexer {
        &self.indexer
    }

    async fn lock_bundle(&self, bundle: PathBuf) -> BundleGuard<'_> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(bundle.clone()).or_default().clone()
        };

        // Built before awaiting so a cancelled wait still releases the entry.
        let mut held = BundleGuard {
            locks: &self.locks,
            bundle,
            guard: None,
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    #[cfg(test)]
    fn tracked_bundles(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn bundle_path(&self, request: &IndexRequest) -> PathBuf {
        request
            .output_path
            .clone()
            .unwrap_or_else(|| self.indexer.index_path(&repository_name(&request.repository_path)))
    }

    pub async fn index_repository(
        &self,
        request: IndexRequest,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<IndexRepositoryResponse> {
        let _guard = self.lock_bundle(self.bundle_path(&request)).await;
        debug!("Acquired build lock for {}", request.repository_path);

        let indexer = self.indexer.clone();
        run_blocking("index_repository", move || {
            indexer.index_repository(&request, progress.as_deref())
        })
        .await
    }

    pub async fn delete_index(&self, repository_name: &str) -> Result<bool> {
        let _guard = self.lock_bundle(self.indexer.index_path(repository_name)).await;

        let indexer = self.indexer.clone();
        let name = repository_name.to_string();
        run_blocking("delete_index", move || indexer.delete_index(&name)).await?
    }

    pub async fn load_index(&self, repository_name: &str) -> Result<Option<LoadedIndex>> {
        let _guard = self.lock_bundle(self.indexer.index_path(repository_name)).await;

        let indexer = self.indexer.clone();
        let name = repository_name.to_string();
        run_blocking("load_index", move || indexer.load_index(&name)).await?
    }

    pub async fn search(
        &self,
        repository_name: &str,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Option<Vec<SearchResult>>> {
        let _guard = self.lock_bundle(self.indexer.index_path(repository_name)).await;

        let indexer = self.indexer.clone();
        let name = repository_name.to_string();
        let query = query.to_string();
        run_blocking("search", move || {
            indexer.search(&name, &query, limit, threshold)
        })
        .await?
    }

    pub async fn list_indexed_repositories(&self) -> Result<Vec<String>> {
        let indexer = self.indexer.clone();
        run_blocking("list_indexed_repositories", move || {
            indexer.list_indexed_repositories()
        })
        .await?
    }

    pub async fn get_index_metadata(&self, repository_name: &str) -> Result<Option<IndexMetadata>> {
        let indexer = self.indexer.clone();
        let name = repository_name.to_string();
        run_blocking("get_index_metadata", move || {
            indexer.get_index_metadata(&name)
        })
        .await?
    }
}
