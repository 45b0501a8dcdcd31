//! Trait definitions for the destination storage collaborator.

use async_trait::async_trait;

use super::error::StorageError;

/// Result of a capped listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListResult {
    /// Objects found, never more than the requested cap.
    pub match_count: usize,
}

/// Read-only view of the destination storage namespace.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Returns the name of this storage implementation.
    fn name(&self) -> &str;

    /// Counts objects in `container` whose key starts with `prefix`,
    /// stopping once `max_results` have been found.
    async fn list(
        &self,
        container: &str,
        prefix: &str,
        max_results: usize,
    ) -> Result<ListResult, StorageError>;
}
