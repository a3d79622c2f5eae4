//! Local filesystem market backend
//!
//! Markets are directories under the configured root. The container hint
//! (or the market name) is used as the directory name as-is.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::backend::{
    load_market, provision_market, MarketBackend, MarketBackendFactory, MetadataDocuments,
};
use crate::errors::Result;
use crate::model::{MarketBackendConfiguration, MarketBackendDeclaration, MarketData};
use crate::store::LocalStore;

const SUPPORTED_BACKEND_TYPES: &[&str] = &["local:v1"];

/// Declares markets on the local filesystem
pub struct LocalFilesystemBackendFactory {
    store: Arc<LocalStore>,
}

impl LocalFilesystemBackendFactory {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    fn documents(&self, container: &str) -> MetadataDocuments {
        MetadataDocuments::new(self.store.clone(), container)
    }
}

#[async_trait]
impl MarketBackendFactory for LocalFilesystemBackendFactory {
    fn name(&self) -> &'static str {
        "LocalFilesystemMarketBackend"
    }

    fn supported_types(&self) -> &'static [&'static str] {
        SUPPORTED_BACKEND_TYPES
    }

    #[instrument(skip(self, declaration))]
    async fn declare_market(
        &self,
        name: &str,
        declaration: &MarketBackendDeclaration,
    ) -> Result<MarketData> {
        self.ensure_supported(&declaration.backend_type)?;

        let directory = declaration.container_hint.as_deref().unwrap_or(name);
        info!(root = %self.store.root().display(), directory = %directory, "Provisioning market directory");

        let documents = self.documents(directory);
        provision_market(&documents, self.store.as_ref(), name, declaration).await
    }

    #[instrument(skip(self, configuration), fields(directory = %configuration.container))]
    async fn reconnect(
        &self,
        configuration: &MarketBackendConfiguration,
    ) -> Result<Arc<dyn MarketBackend>> {
        self.ensure_supported(&configuration.backend_type)?;

        let documents = self.documents(&configuration.container);
        let market_data = load_market(&documents, configuration).await?;
        Ok(Arc::new(LocalFilesystemMarketBackend {
            documents,
            market_data,
        }))
    }
}

/// A market connected through the local filesystem
pub struct LocalFilesystemMarketBackend {
    documents: MetadataDocuments,
    market_data: MarketData,
}

impl MarketBackend for LocalFilesystemMarketBackend {
    fn documents(&self) -> &MetadataDocuments {
        &self.documents
    }

    fn market_data(&self) -> &MarketData {
        &self.market_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketError;
    use crate::keys;
    use crate::model::{DatasetArgs, ProducerArgs};
    use serde_json::json;

    fn factory(root: &std::path::Path) -> LocalFilesystemBackendFactory {
        LocalFilesystemBackendFactory::new(Arc::new(LocalStore::new(root)))
    }

    #[tokio::test]
    async fn test_declare_market_creates_metadata_file() {
        let root = tempfile::tempdir().unwrap();
        let factory = factory(root.path());

        let market = factory
            .declare_market("veg-market", &MarketBackendDeclaration::new("local:v1", "Fresh vegetables"))
            .await
            .unwrap();

        assert_eq!(market.backend_configuration.container, "veg-market");
        assert_eq!(market.backend_configuration.region, None);

        let path = root
            .path()
            .join("veg-market")
            .join(keys::store_path(&keys::market_key("veg-market")));
        let on_disk = std::fs::read_to_string(path).unwrap();
        assert_eq!(on_disk, crate::codec::serialize(&market).unwrap());
    }

    #[tokio::test]
    async fn test_producer_and_dataset_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let factory = factory(root.path());
        let declaration = MarketBackendDeclaration::new("local:v1", "Fresh vegetables")
            .with_container_hint("markets-dir");
        let market = factory.declare_market("veg-market", &declaration).await.unwrap();
        assert_eq!(market.backend_configuration.container, "markets-dir");

        let backend = factory.reconnect(&market.backend_configuration).await.unwrap();
        let producer = ProducerArgs {
            description: "Delicious pumpkins".to_string(),
            ..Default::default()
        };
        backend.declare_producer("pumpkintown", &producer).await.unwrap();

        let dataset = DatasetArgs {
            metadata: [("rows".to_string(), json!(42))].into_iter().collect(),
            ..Default::default()
        };
        backend
            .declare_dataset("pumpkintown", "harvest", &dataset)
            .await
            .unwrap();

        assert_eq!(
            backend.get_producer("pumpkintown").await.unwrap().description,
            "Delicious pumpkins"
        );
        assert_eq!(
            backend.get_dataset("pumpkintown", "harvest").await.unwrap().metadata["rows"],
            json!(42)
        );
    }

    #[tokio::test]
    async fn test_object_store_type_is_unsupported() {
        let root = tempfile::tempdir().unwrap();
        let factory = factory(root.path());
        let error = factory
            .declare_market("veg-market", &MarketBackendDeclaration::new("object-store:v1", ""))
            .await
            .unwrap_err();
        assert!(matches!(error, MarketError::UnsupportedBackendType { .. }));
    }

    #[tokio::test]
    async fn test_reconnect_with_wrong_directory() {
        let root = tempfile::tempdir().unwrap();
        let factory = factory(root.path());
        let market = factory
            .declare_market("veg-market", &MarketBackendDeclaration::new("local:v1", ""))
            .await
            .unwrap();

        let mut altered = market.backend_configuration.clone();
        altered.container = "elsewhere".to_string();
        let error = factory.reconnect(&altered).await.err().unwrap();
        assert!(error.is_not_found());
    }
}
