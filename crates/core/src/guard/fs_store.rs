//! Filesystem-backed destination storage.
//!
//! Each container is a directory under the configured root and object keys
//! are `/`-separated paths relative to it, so `vod/asset-1/index.m3u8` in
//! container `media` lives at `<root>/media/vod/asset-1/index.m3u8`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{ListResult, ObjectLister, StorageError};

/// Object lister over a local (or mounted) directory tree.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn container_dir(&self, container: &str) -> Result<PathBuf, StorageError> {
        if container.is_empty() || container.contains('/') || !is_relative_safe(container) {
            return Err(StorageError::InvalidKey(container.to_string()));
        }

        let dir = self.root.join(container);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StorageError::ContainerNotFound(container.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::ContainerNotFound(container.to_string()))
            }
            Err(e) => Err(StorageError::io(dir, e)),
        }
    }
}

#[async_trait]
impl ObjectLister for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn list(
        &self,
        container: &str,
        prefix: &str,
        max_results: usize,
    ) -> Result<ListResult, StorageError> {
        if prefix.starts_with('/') || !is_relative_safe(prefix) {
            return Err(StorageError::InvalidKey(prefix.to_string()));
        }

        let container_dir = self.container_dir(container).await?;
        if max_results == 0 {
            return Ok(ListResult { match_count: 0 });
        }

        // Keys under "a/b/c" live in directory "a/b" with names starting "c".
        let (dir_part, name_part) = match prefix.rfind('/') {
            Some(idx) => (&prefix[..idx], &prefix[idx + 1..]),
            None => ("", prefix),
        };
        let start_dir = if dir_part.is_empty() {
            container_dir
        } else {
            container_dir.join(dir_part)
        };

        let mut match_count = 0;
        let mut pending = Vec::new();

        let Some(mut entries) = read_dir_if_exists(&start_dir).await? else {
            debug!(container, prefix, "Listing prefix does not exist");
            return Ok(ListResult { match_count: 0 });
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&start_dir, e))?
        {
            if !entry.file_name().to_string_lossy().starts_with(name_part) {
                continue;
            }
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(entry.path(), e))?;
            if file_type.is_file() {
                match_count += 1;
                if match_count >= max_results {
                    return Ok(ListResult { match_count });
                }
            } else if file_type.is_dir() {
                pending.push(entry.path());
            }
        }

        while let Some(dir) = pending.pop() {
            let Some(mut entries) = read_dir_if_exists(&dir).await? else {
                continue;
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(&dir, e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(entry.path(), e))?;
                if file_type.is_file() {
                    match_count += 1;
                    if match_count >= max_results {
                        return Ok(ListResult { match_count });
                    }
                } else if file_type.is_dir() {
                    pending.push(entry.path());
                }
            }
        }

        Ok(ListResult { match_count })
    }
}

async fn read_dir_if_exists(dir: &Path) -> Result<Option<fs::ReadDir>, StorageError> {
    match fs::read_dir(dir).await {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::NotADirectory => {
            Ok(None)
        }
        Err(e) => Err(StorageError::io(dir, e)),
    }
}

fn is_relative_safe(key: &str) -> bool {
    Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsObjectStore) {
        let temp_dir = TempDir::new().unwrap();
        std_fs::create_dir_all(temp_dir.path().join("media")).unwrap();
        let store = FsObjectStore::new(temp_dir.path());
        (temp_dir, store)
    }

    fn write(temp_dir: &TempDir, key: &str) {
        let path = temp_dir.path().join(key);
        std_fs::create_dir_all(path.parent().unwrap()).unwrap();
        std_fs::write(path, b"segment").unwrap();
    }

    #[tokio::test]
    async fn test_empty_prefix_counts_zero() {
        let (_temp_dir, store) = setup();
        let result = store.list("media", "vod/asset-1/", 1).await.unwrap();
        assert_eq!(result.match_count, 0);
    }

    #[tokio::test]
    async fn test_counts_nested_objects_up_to_cap() {
        let (temp_dir, store) = setup();
        write(&temp_dir, "media/vod/asset-1/index.m3u8");
        write(&temp_dir, "media/vod/asset-1/720p/seg_001.ts");
        write(&temp_dir, "media/vod/asset-1/720p/seg_002.ts");

        let capped = store.list("media", "vod/asset-1/", 1).await.unwrap();
        assert_eq!(capped.match_count, 1);

        let all = store.list("media", "vod/asset-1/", 100).await.unwrap();
        assert_eq!(all.match_count, 3);
    }

    #[tokio::test]
    async fn test_trailing_slash_excludes_sibling_prefix() {
        let (temp_dir, store) = setup();
        write(&temp_dir, "media/vod/dash_compact_iframe/manifest.mpd");

        let exact = store.list("media", "vod/dash_compact/", 1).await.unwrap();
        assert_eq!(exact.match_count, 0);

        let loose = store.list("media", "vod/dash_compact", 10).await.unwrap();
        assert_eq!(loose.match_count, 1);
    }

    #[tokio::test]
    async fn test_missing_container_is_an_error() {
        let (_temp_dir, store) = setup();
        let err = store.list("other", "vod/", 1).await.unwrap_err();
        assert!(matches!(err, StorageError::ContainerNotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_temp_dir, store) = setup();
        assert!(matches!(
            store.list("media", "../secrets/", 1).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.list("..", "vod/", 1).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.list("media", "/etc/", 1).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
