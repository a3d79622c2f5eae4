//! In-memory store implementation
//!
//! One `object_store::memory::InMemory` per container. Nothing is persisted.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::errors::{MarketError, Result};
use crate::store::{object_path, ObjectStoreClient};

/// In-memory container store
#[derive(Default)]
pub struct InMemoryStore {
    containers: Mutex<HashMap<String, Arc<InMemory>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn container(&self, container: &str, key: &str) -> Result<Arc<InMemory>> {
        let containers = self.containers.lock().unwrap_or_else(PoisonError::into_inner);
        containers
            .get(container)
            .cloned()
            .ok_or_else(|| MarketError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            })
    }

    /// Names of all containers created so far
    pub fn containers(&self) -> Vec<String> {
        let containers = self.containers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = containers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        let mut containers = self.containers.lock().unwrap_or_else(PoisonError::into_inner);
        containers
            .entry(container.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()));
        Ok(())
    }

    async fn set_writer_owns_objects(&self, container: &str) -> Result<()> {
        debug!(container = %container, "Ownership controls are implicit in memory");
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let store = self.container(container, key)?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let mut opts = PutOptions::default();
        opts.attributes = attributes;

        store
            .put_opts(&object_path(key), content.into(), opts)
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<Bytes> {
        let store = self.container(container, key)?;
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
