//! Declarative resource wrappers
//!
//! These are what an infrastructure program instantiates. Each wrapper picks
//! a backend from the registry, runs the matching declare operation and
//! keeps the written document as its outputs.
//!
//! Inputs must be resolved at declaration time. An `Input::Unknown` (a value
//! another resource has not produced yet) fails the declaration immediately.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::codec;
use crate::errors::{MarketError, Result};
use crate::metrics;
use crate::model::{
    DatasetArgs, DatasetData, MarketBackendConfiguration, MarketBackendDeclaration, MarketData,
    ProducerArgs, ProducerData,
};
use crate::registry::BackendRegistry;

/// Named stack outputs of a resource
pub type Outputs = BTreeMap<String, Value>;

/// A resource input that may not have been produced yet
#[derive(Debug, Clone, PartialEq)]
pub enum Input<T> {
    Known(T),
    Unknown,
}

impl<T> Input<T> {
    /// The value, or `PendingInput` naming the resource that needed it
    pub fn resolve(self, resource: &str) -> Result<T> {
        match self {
            Input::Known(value) => Ok(value),
            Input::Unknown => Err(MarketError::PendingInput {
                resource: resource.to_string(),
            }),
        }
    }
}

impl<T> From<T> for Input<T> {
    fn from(value: T) -> Self {
        Input::Known(value)
    }
}

fn output<T: Serialize>(outputs: &mut Outputs, name: &str, value: &T) -> Result<()> {
    outputs.insert(name.to_string(), serde_json::to_value(value)?);
    Ok(())
}

/// A declared market
#[derive(Debug, Clone)]
pub struct MarketResource {
    pub name: String,
    pub market_data: MarketData,
    pub etag: String,
}

impl MarketResource {
    pub const TYPE: &'static str = "shopkeeper:index:Market";

    pub async fn declare(
        registry: &BackendRegistry,
        name: &str,
        declaration: Input<MarketBackendDeclaration>,
    ) -> Result<Self> {
        let declaration = declaration.resolve(name)?;
        info!(resource = Self::TYPE, name = %name, backend_type = %declaration.backend_type, "Registering resource");

        let backend = registry.get(&declaration.backend_type)?;
        let market_data = backend.declare_market(name, &declaration).await?;
        let etag = codec::fingerprint(&codec::serialize(&market_data)?);
        metrics::record_declaration("market", &declaration.backend_type);

        Ok(Self {
            name: name.to_string(),
            market_data,
            etag,
        })
    }

    /// Configuration to hand to producers and datasets of this market
    pub fn backend_configuration(&self) -> &MarketBackendConfiguration {
        &self.market_data.backend_configuration
    }

    pub fn outputs(&self) -> Result<Outputs> {
        let mut outputs = Outputs::new();
        output(&mut outputs, "marketData", &self.market_data)?;
        output(&mut outputs, "backend_configuration", self.backend_configuration())?;
        output(&mut outputs, "etag", &self.etag)?;
        Ok(outputs)
    }
}

/// A declared producer
#[derive(Debug, Clone)]
pub struct ProducerResource {
    pub name: String,
    pub producer_data: ProducerData,
    pub etag: String,
}

impl ProducerResource {
    pub const TYPE: &'static str = "shopkeeper:index:Producer";

    pub async fn declare(
        registry: &BackendRegistry,
        name: &str,
        backend_configuration: Input<MarketBackendConfiguration>,
        args: ProducerArgs,
    ) -> Result<Self> {
        let backend_configuration = backend_configuration.resolve(name)?;
        info!(resource = Self::TYPE, name = %name, market = %backend_configuration.market_metadata_key, "Registering resource");

        let backend = registry.connect(&backend_configuration).await?;
        let producer_data = backend.declare_producer(name, &args).await?;
        let etag = codec::fingerprint(&codec::serialize(&producer_data)?);
        metrics::record_declaration("producer", &backend_configuration.backend_type);

        Ok(Self {
            name: name.to_string(),
            producer_data,
            etag,
        })
    }

    pub fn outputs(&self) -> Result<Outputs> {
        let mut outputs = Outputs::new();
        output(&mut outputs, "producerData", &self.producer_data)?;
        output(&mut outputs, "etag", &self.etag)?;
        Ok(outputs)
    }
}

/// A declared dataset
#[derive(Debug, Clone)]
pub struct DatasetResource {
    pub name: String,
    pub dataset_data: DatasetData,
    pub etag: String,
}

impl DatasetResource {
    pub const TYPE: &'static str = "shopkeeper:index:Dataset";

    pub async fn declare(
        registry: &BackendRegistry,
        name: &str,
        backend_configuration: Input<MarketBackendConfiguration>,
        producer: &str,
        args: DatasetArgs,
    ) -> Result<Self> {
        let backend_configuration = backend_configuration.resolve(name)?;
        info!(resource = Self::TYPE, name = %name, producer = %producer, "Registering resource");

        let backend = registry.connect(&backend_configuration).await?;
        let dataset_data = backend.declare_dataset(producer, name, &args).await?;
        let etag = codec::fingerprint(&codec::serialize(&dataset_data)?);
        metrics::record_declaration("dataset", &backend_configuration.backend_type);

        Ok(Self {
            name: name.to_string(),
            dataset_data,
            etag,
        })
    }

    pub fn outputs(&self) -> Result<Outputs> {
        let mut outputs = Outputs::new();
        output(&mut outputs, "datasetData", &self.dataset_data)?;
        output(&mut outputs, "etag", &self.etag)?;
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ObjectStoreBackendFactory;
    use crate::store::InMemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        registry.register_factory(Arc::new(ObjectStoreBackendFactory::new(Arc::new(
            InMemoryStore::new(),
        ))));
        registry
    }

    #[tokio::test]
    async fn test_market_outputs() {
        let registry = registry();
        let market = MarketResource::declare(
            &registry,
            "veg-market",
            MarketBackendDeclaration::new("object-store:v1", "Fresh vegetables").into(),
        )
        .await
        .unwrap();

        let outputs = market.outputs().unwrap();
        assert_eq!(outputs["marketData"]["name"], json!("veg-market"));
        assert_eq!(
            outputs["backend_configuration"]["backend_type"],
            json!("object-store:v1")
        );
        assert_eq!(
            outputs["etag"],
            json!(codec::fingerprint(&codec::serialize(&market.market_data).unwrap()))
        );
    }

    #[tokio::test]
    async fn test_unknown_input_fails_immediately() {
        let registry = registry();
        let error = MarketResource::declare(&registry, "veg-market", Input::Unknown)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            MarketError::PendingInput { ref resource } if resource == "veg-market"
        ));

        let error = ProducerResource::declare(
            &registry,
            "pumpkintown",
            Input::Unknown,
            ProducerArgs::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(error, MarketError::PendingInput { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_backend_type_fails() {
        let error = MarketResource::declare(
            &registry(),
            "veg-market",
            MarketBackendDeclaration::new("nonexistent-backend", "").into(),
        )
        .await
        .unwrap_err();
        assert!(matches!(error, MarketError::UnknownBackend { .. }));
    }

    #[tokio::test]
    async fn test_producer_and_dataset_from_market_configuration() {
        let registry = registry();
        let market = MarketResource::declare(
            &registry,
            "veg-market",
            MarketBackendDeclaration::new("object-store:v1", "Fresh vegetables").into(),
        )
        .await
        .unwrap();

        let producer = ProducerResource::declare(
            &registry,
            "pumpkintown",
            market.backend_configuration().clone().into(),
            ProducerArgs {
                description: "Delicious pumpkins".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(
            producer.outputs().unwrap()["producerData"]["description"],
            json!("Delicious pumpkins")
        );

        let dataset = DatasetResource::declare(
            &registry,
            "harvest",
            market.backend_configuration().clone().into(),
            "pumpkintown",
            DatasetArgs::default(),
        )
        .await
        .unwrap();
        assert_eq!(dataset.dataset_data.producer, "pumpkintown");
        assert!(dataset.outputs().unwrap().contains_key("datasetData"));
    }
}
