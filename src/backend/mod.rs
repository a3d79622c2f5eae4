//! Market backends
//!
//! A backend provisions a market's container and manages the metadata
//! documents inside it. Two seams:
//! - `MarketBackendFactory`: what the registry holds per backend type.
//!   Declares new markets and reconnects to existing ones.
//! - `MarketBackend`: a connected market. Declares and reads producers and
//!   datasets. The document logic is shared through default methods; a
//!   variant only supplies its store and market data.
//!
//! Variants:
//! - `ObjectStoreMarketBackend` (`object-store:v1`, `object-store:latest`)
//! - `LocalFilesystemMarketBackend` (`local:v1`)

mod local;
mod object_storage;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::codec;
use crate::config::Config;
use crate::errors::{MarketError, Result};
use crate::keys;
use crate::metrics;
use crate::model::{
    merge_tags, DatasetArgs, DatasetData, MarketBackendConfiguration, MarketBackendDeclaration,
    MarketData, ProducerArgs, ProducerData,
};
use crate::registry::BackendRegistry;
use crate::store::{LocalStore, ObjectStoreClient, S3Store};

pub use self::local::{LocalFilesystemBackendFactory, LocalFilesystemMarketBackend};
pub use self::object_storage::{ObjectStoreBackendFactory, ObjectStoreMarketBackend};

/// Declares markets and reconnects to them
#[async_trait]
pub trait MarketBackendFactory: Send + Sync {
    /// Implementation name used in errors and logs
    fn name(&self) -> &'static str;

    /// Backend type identifiers this factory accepts
    fn supported_types(&self) -> &'static [&'static str];

    /// Provision a container and write the market document
    async fn declare_market(
        &self,
        name: &str,
        declaration: &MarketBackendDeclaration,
    ) -> Result<MarketData>;

    /// Connect to an existing market, validating the stored configuration
    async fn reconnect(
        &self,
        configuration: &MarketBackendConfiguration,
    ) -> Result<Arc<dyn MarketBackend>>;

    /// Fail with `UnsupportedBackendType` unless `backend_type` is accepted
    fn ensure_supported(&self, backend_type: &str) -> Result<()> {
        if self.supported_types().contains(&backend_type) {
            Ok(())
        } else {
            Err(MarketError::UnsupportedBackendType {
                backend_type: backend_type.to_string(),
                backend: self.name(),
            })
        }
    }
}

/// A connected market
#[async_trait]
pub trait MarketBackend: Send + Sync {
    /// Documents inside this market's container
    fn documents(&self) -> &MetadataDocuments;

    /// The market document this backend was validated against
    fn market_data(&self) -> &MarketData;

    fn backend_configuration(&self) -> &MarketBackendConfiguration {
        &self.market_data().backend_configuration
    }

    /// Write a producer document, replacing any earlier one
    #[instrument(skip(self, args))]
    async fn declare_producer(&self, name: &str, args: &ProducerArgs) -> Result<ProducerData> {
        let market = self.market_data();
        let key = keys::producer_key(&market.name, name);

        let data = ProducerData {
            metadata_version: keys::METADATA_VERSION.to_string(),
            name: name.to_string(),
            market: market.name.clone(),
            description: args.description.clone(),
            key: key.clone(),
            metadata: args.metadata.clone(),
            tags: merge_tags(&market.tags, &args.tags),
        };

        let etag = self.documents().write(&key, &data).await?;
        info!(producer = %name, etag = %etag, "Declared producer");
        Ok(data)
    }

    #[instrument(skip(self))]
    async fn get_producer(&self, name: &str) -> Result<ProducerData> {
        let key = keys::producer_key(&self.market_data().name, name);
        self.documents().read(&key).await
    }

    /// Write a dataset document. The producer is not checked for existence.
    #[instrument(skip(self, args))]
    async fn declare_dataset(
        &self,
        producer: &str,
        name: &str,
        args: &DatasetArgs,
    ) -> Result<DatasetData> {
        let market = self.market_data();
        let key = keys::dataset_key(&market.name, producer, name);

        let data = DatasetData {
            metadata_version: keys::METADATA_VERSION.to_string(),
            name: name.to_string(),
            market: market.name.clone(),
            producer: producer.to_string(),
            description: args.description.clone(),
            key: key.clone(),
            metadata: args.metadata.clone(),
            configuration: args.configuration.clone(),
            tags: merge_tags(&market.tags, &args.tags),
        };

        let etag = self.documents().write(&key, &data).await?;
        info!(producer = %producer, dataset = %name, etag = %etag, "Declared dataset");
        Ok(data)
    }

    #[instrument(skip(self))]
    async fn get_dataset(&self, producer: &str, name: &str) -> Result<DatasetData> {
        let key = keys::dataset_key(&self.market_data().name, producer, name);
        self.documents().read(&key).await
    }
}

/// Serialized metadata documents inside one container
#[derive(Clone)]
pub struct MetadataDocuments {
    store: Arc<dyn ObjectStoreClient>,
    container: String,
}

impl MetadataDocuments {
    pub fn new(store: Arc<dyn ObjectStoreClient>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Serialize, fingerprint and write a document; returns the etag
    pub async fn write<T: Serialize + Sync>(&self, key: &str, document: &T) -> Result<String> {
        let content = codec::serialize(document)?;
        let etag = codec::fingerprint(&content);
        debug!(store = self.store.name(), container = %self.container, key = %key, etag = %etag, "Writing metadata");

        let started = Instant::now();
        let result = self
            .store
            .put(&self.container, key, Bytes::from(content), codec::CONTENT_TYPE)
            .await;
        metrics::observe_store("put", started, &result);
        result?;

        Ok(etag)
    }

    /// Read raw document bytes
    pub async fn read_raw(&self, key: &str) -> Result<Bytes> {
        let started = Instant::now();
        let result = self.store.get(&self.container, key).await;
        metrics::observe_store("get", started, &result);
        result
    }

    /// Read and deserialize a document
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let content = self.read_raw(key).await?;
        codec::deserialize(&content)
    }
}

/// Read the market document at `configuration` and check it points back there
pub(crate) async fn load_market(
    documents: &MetadataDocuments,
    configuration: &MarketBackendConfiguration,
) -> Result<MarketData> {
    let market: MarketData = documents.read(&configuration.market_metadata_key).await?;

    if !codec::canonical_eq(&market.backend_configuration, configuration)? {
        let supplied = codec::serialize(configuration)?;
        let stored = codec::serialize(&market.backend_configuration)?;
        warn!(supplied = %supplied, stored = %stored, "Backend configuration mismatch");
        return Err(MarketError::ConfigurationMismatch { supplied, stored });
    }

    Ok(market)
}

/// Create the container, set ownership and write the market document
pub(crate) async fn provision_market(
    documents: &MetadataDocuments,
    store: &dyn ObjectStoreClient,
    name: &str,
    declaration: &MarketBackendDeclaration,
) -> Result<MarketData> {
    let container = documents.container();
    store.create_container(container).await?;
    store.set_writer_owns_objects(container).await?;

    let market_metadata_key = keys::market_key(name);
    let market = MarketData {
        metadata_version: keys::METADATA_VERSION.to_string(),
        name: name.to_string(),
        description: declaration.description.clone(),
        backend_configuration: MarketBackendConfiguration {
            backend_type: declaration.backend_type.clone(),
            container: container.to_string(),
            market_metadata_key: market_metadata_key.clone(),
            region: store.region(),
        },
        tags: declaration.tags.clone(),
        extensions: declaration.extensions.clone(),
    };

    let etag = documents.write(&market_metadata_key, &market).await?;
    info!(market = %name, container = %container, etag = %etag, "Declared market");
    Ok(market)
}

/// Registry with the object storage (S3) and local filesystem backends
pub async fn default_registry(config: &Config) -> Result<BackendRegistry> {
    let s3: Arc<dyn ObjectStoreClient> = Arc::new(S3Store::new(&config.aws).await?);
    let local = Arc::new(LocalStore::new(config.local.root.clone()));

    let mut registry = BackendRegistry::new();
    registry.register_factory(Arc::new(ObjectStoreBackendFactory::new(s3)));
    registry.register_factory(Arc::new(LocalFilesystemBackendFactory::new(local)));
    Ok(registry)
}
