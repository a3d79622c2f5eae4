//! Local filesystem store implementation
//!
//! Each container is a directory under a configured root, served through
//! `object_store::local::LocalFileSystem`. Ownership controls and content
//! types have no filesystem equivalent and are skipped.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use std::path::{Path as FsPath, PathBuf};
use tracing::debug;

use crate::errors::{MarketError, Result};
use crate::store::{object_path, ObjectStoreClient};

/// Directory-backed container store
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &FsPath {
        &self.root
    }

    fn container_dir(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }

    fn open(&self, container: &str, key: &str) -> Result<LocalFileSystem> {
        let dir = self.container_dir(container);
        if !dir.is_dir() {
            return Err(MarketError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            });
        }
        Ok(LocalFileSystem::new_with_prefix(dir)?)
    }
}

#[async_trait]
impl ObjectStoreClient for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        let dir = self.container_dir(container);
        tokio::fs::create_dir_all(&dir).await?;
        debug!(path = %dir.display(), "Created container directory");
        Ok(())
    }

    async fn set_writer_owns_objects(&self, container: &str) -> Result<()> {
        debug!(container = %container, "Ownership controls not applicable to local filesystem");
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let store = self.open(container, key)?;
        debug!(container = %container, key = %key, content_type = %content_type, "Writing file");
        store
            .put(&object_path(key), content.into())
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<Bytes> {
        let store = self.open(container, key)?;
        let data = store
            .get(&object_path(key))
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        let bytes = data
            .bytes()
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_under_container_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path());
        store.create_container("veg").await.unwrap();
        store
            .put(
                "veg",
                "/shopkeeper/market=veg/metadata-v1.json",
                Bytes::from_static(b"{}"),
                "application/json",
            )
            .await
            .unwrap();

        let on_disk = root
            .path()
            .join("veg/shopkeeper/market=veg/metadata-v1.json");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"{}");

        let content = store
            .get("veg", "/shopkeeper/market=veg/metadata-v1.json")
            .await
            .unwrap();
        assert_eq!(content, Bytes::from_static(b"{}"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path());
        store.create_container("veg").await.unwrap();
        assert!(store.get("veg", "nope.json").await.unwrap_err().is_not_found());
        assert!(store.get("other", "nope.json").await.unwrap_err().is_not_found());
    }
}
