//! Idempotency guard for transfer destinations.
//!
//! Before the first worker invocation the orchestrator asks the guard whether
//! the destination prefix already holds objects. Any object at all means a
//! previous run got there first, and the new run must not start. Listing
//! failures are reported as errors so the caller refuses rather than risk an
//! overwrite.

mod error;
mod fs_store;
mod traits;

pub use error::StorageError;
pub use fs_store::FsObjectStore;
pub use traits::{ListResult, ObjectLister};

use std::sync::Arc;

use tracing::debug;

/// Checks destinations for pre-existing output.
#[derive(Clone)]
pub struct IdempotencyGuard {
    lister: Arc<dyn ObjectLister>,
}

impl IdempotencyGuard {
    pub fn new(lister: Arc<dyn ObjectLister>) -> Self {
        Self { lister }
    }

    /// Returns true iff no object exists under `prefix` in `container`.
    pub async fn check_destination_empty(
        &self,
        container: &str,
        prefix: &str,
    ) -> Result<bool, StorageError> {
        let listing = self.lister.list(container, prefix, 1).await?;
        debug!(
            container,
            prefix,
            storage = self.lister.name(),
            matches = listing.match_count,
            "Checked destination for existing output"
        );
        Ok(listing.match_count == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockObjectStore;

    #[tokio::test]
    async fn test_empty_destination() {
        let store = Arc::new(MockObjectStore::new());
        let guard = IdempotencyGuard::new(store.clone());

        assert!(guard.check_destination_empty("media", "vod/a/").await.unwrap());
        assert_eq!(store.list_calls().await, vec![("media".to_string(), "vod/a/".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_occupied_destination() {
        let store = Arc::new(MockObjectStore::new());
        store.insert("media", "vod/a/index.m3u8").await;
        store.insert("media", "vod/a/seg_1.ts").await;
        let guard = IdempotencyGuard::new(store);

        assert!(!guard.check_destination_empty("media", "vod/a/").await.unwrap());
        assert!(guard.check_destination_empty("media", "vod/b/").await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let store = Arc::new(MockObjectStore::new());
        store
            .set_next_error(StorageError::Backend("access denied".to_string()))
            .await;
        let guard = IdempotencyGuard::new(store);

        let err = guard.check_destination_empty("media", "vod/a/").await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
