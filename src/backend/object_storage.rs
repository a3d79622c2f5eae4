//! Object storage market backend
//!
//! The metadata structure in a market's bucket:
//!
//! ```text
//! shopkeeper/market={market-name}/
//! ├── metadata-v1.json
//! └── producer={producer-name}/
//!     ├── metadata-v1.json
//!     └── dataset={dataset-name}/
//!         └── metadata-v1.json
//! ```
//!
//! Each market gets its own bucket, named from the container hint plus a
//! random suffix so that redeclaring in another account or region does not
//! collide on the global bucket namespace.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::backend::{
    load_market, provision_market, MarketBackend, MarketBackendFactory, MetadataDocuments,
};
use crate::errors::Result;
use crate::model::{MarketBackendConfiguration, MarketBackendDeclaration, MarketData};
use crate::store::ObjectStoreClient;

const SUPPORTED_BACKEND_TYPES: &[&str] = &["object-store:v1", "object-store:latest"];

/// S3 bucket names are at most 63 characters
const MAX_BUCKET_NAME: usize = 63;
const SUFFIX_LEN: usize = 12;

/// Declares markets on an object store
pub struct ObjectStoreBackendFactory {
    store: Arc<dyn ObjectStoreClient>,
}

impl ObjectStoreBackendFactory {
    pub fn new(store: Arc<dyn ObjectStoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MarketBackendFactory for ObjectStoreBackendFactory {
    fn name(&self) -> &'static str {
        "ObjectStoreMarketBackend"
    }

    fn supported_types(&self) -> &'static [&'static str] {
        SUPPORTED_BACKEND_TYPES
    }

    #[instrument(skip(self, declaration), fields(backend_type = %declaration.backend_type))]
    async fn declare_market(
        &self,
        name: &str,
        declaration: &MarketBackendDeclaration,
    ) -> Result<MarketData> {
        self.ensure_supported(&declaration.backend_type)?;

        let hint = declaration.container_hint.as_deref().unwrap_or(name);
        let bucket = unique_bucket_name(hint);
        info!(bucket = %bucket, "Provisioning market bucket");

        let documents = MetadataDocuments::new(self.store.clone(), bucket);
        provision_market(&documents, self.store.as_ref(), name, declaration).await
    }

    #[instrument(skip(self, configuration), fields(bucket = %configuration.container))]
    async fn reconnect(
        &self,
        configuration: &MarketBackendConfiguration,
    ) -> Result<Arc<dyn MarketBackend>> {
        self.ensure_supported(&configuration.backend_type)?;

        let documents = MetadataDocuments::new(self.store.clone(), configuration.container.clone());
        let market_data = load_market(&documents, configuration).await?;
        Ok(Arc::new(ObjectStoreMarketBackend {
            documents,
            market_data,
        }))
    }
}

/// A market connected through an object store
pub struct ObjectStoreMarketBackend {
    documents: MetadataDocuments,
    market_data: MarketData,
}

impl MarketBackend for ObjectStoreMarketBackend {
    fn documents(&self) -> &MetadataDocuments {
        &self.documents
    }

    fn market_data(&self) -> &MarketData {
        &self.market_data
    }
}

/// `{hint}-{random}` restricted to characters S3 accepts in bucket names
fn unique_bucket_name(hint: &str) -> String {
    let mut prefix: String = hint
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            c @ ('a'..='z' | '0'..='9' | '-') => c,
            _ => '-',
        })
        .take(MAX_BUCKET_NAME - SUFFIX_LEN - 1)
        .collect();
    prefix = prefix.trim_matches('-').to_string();
    if prefix.is_empty() {
        prefix.push_str("market");
    }

    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..SUFFIX_LEN])
}
