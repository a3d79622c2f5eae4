//! Object storage client abstraction
//!
//! The market backends only need a handful of operations against a named
//! container: create it, lock object ownership to the writer, and put/get a
//! blob by key. Implementations delegate data operations to the object_store
//! crate:
//! - `S3Store`: AWS S3 (aws-sdk-s3 for the bucket control plane)
//! - `LocalStore`: directories under a local root
//! - `InMemoryStore`: process-local, for tests and dry runs

mod local;
mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path;

use crate::errors::Result;
use crate::keys;

pub use local::LocalStore;
pub use memory::InMemoryStore;
pub use s3::S3Store;

/// Unified put/get interface over a container-addressed blob store
///
/// `put` overwrites unconditionally. There is no optimistic-concurrency
/// guard, so concurrent writers to one key are last-writer-wins.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Region the containers live in, if the store has one
    fn region(&self) -> Option<String> {
        None
    }

    /// Create a container with exactly this name
    async fn create_container(&self, container: &str) -> Result<()>;

    /// Make objects owned by whoever writes them (one-time container setup)
    async fn set_writer_owns_objects(&self, container: &str) -> Result<()>;

    /// Write `content` at `key`, replacing any existing object
    async fn put(&self, container: &str, key: &str, content: Bytes, content_type: &str)
        -> Result<()>;

    /// Read the object at `key`; `MarketError::NotFound` when absent
    async fn get(&self, container: &str, key: &str) -> Result<Bytes>;
}

/// Convert a metadata key into an object_store path
pub(crate) fn object_path(key: &str) -> Path {
    Path::from(keys::store_path(key))
}
