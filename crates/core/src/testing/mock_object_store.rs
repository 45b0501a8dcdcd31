//! Mock object store for testing.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::guard::{ListResult, ObjectLister, StorageError};

/// In-memory object store.
///
/// Keys are plain strings per container; listing counts keys starting with
/// the prefix. A container nobody inserted into lists as empty.
///
/// # Example
///
/// ```rust,ignore
/// use vodmigrator_core::testing::MockObjectStore;
///
/// let store = MockObjectStore::new();
/// store.insert("media", "vod/asset-1/index.m3u8").await;
///
/// let guard = IdempotencyGuard::new(Arc::new(store));
/// assert!(!guard.check_destination_empty("media", "vod/asset-1/").await?);
/// ```
#[derive(Debug)]
pub struct MockObjectStore {
    /// Keys by container.
    objects: Arc<RwLock<HashMap<String, BTreeSet<String>>>>,
    /// Recorded `(container, prefix, max_results)` list calls.
    list_calls: Arc<RwLock<Vec<(String, String, usize)>>>,
    /// If set, the next list call fails with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            list_calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Add an object.
    pub async fn insert(&self, container: &str, key: &str) {
        self.objects
            .write()
            .await
            .entry(container.to_string())
            .or_default()
            .insert(key.to_string());
    }

    /// All keys in a container, sorted.
    pub async fn keys(&self, container: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .get(container)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of objects across containers.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.values().map(BTreeSet::len).sum()
    }

    /// Get all recorded list calls.
    pub async fn list_calls(&self) -> Vec<(String, String, usize)> {
        self.list_calls.read().await.clone()
    }

    /// Configure the next list call to fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ObjectLister for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list(
        &self,
        container: &str,
        prefix: &str,
        max_results: usize,
    ) -> Result<ListResult, StorageError> {
        self.list_calls.write().await.push((
            container.to_string(),
            prefix.to_string(),
            max_results,
        ));

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let match_count = self
            .objects
            .read()
            .await
            .get(container)
            .map(|keys| {
                keys.iter()
                    .filter(|key| key.starts_with(prefix))
                    .take(max_results)
                    .count()
            })
            .unwrap_or(0);

        Ok(ListResult { match_count })
    }
}
