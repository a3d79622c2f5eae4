//! Infrastructure programs
//!
//! A program is a TOML file declaring markets, producers and datasets:
//!
//! ```toml
//! [[market]]
//! name = "veg-market"
//! backend_type = "object-store:v1"
//! description = "Fresh and nutritious vegetables"
//!
//! [[producer]]
//! name = "pumpkintown"
//! market = "veg-market"
//! description = "Delicious pumpkins"
//! metadata = { product_owner = "pete@pumpkintown.com" }
//!
//! [[dataset]]
//! name = "harvest"
//! market = "veg-market"
//! producer = "pumpkintown"
//! ```
//!
//! Resources are declared in order: markets, then producers, then datasets.
//! A producer or dataset refers to its market either by the name of a market
//! in the same program or by an explicit `backend_configuration` table.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::errors::{MarketError, Result};
use crate::model::{DatasetArgs, MarketBackendConfiguration, MarketBackendDeclaration, ProducerArgs};
use crate::registry::BackendRegistry;
use crate::resource::{DatasetResource, Input, MarketResource, Outputs, ProducerResource};

#[derive(Debug, Clone, Deserialize)]
pub struct MarketSpec {
    pub name: String,
    #[serde(flatten)]
    pub declaration: MarketBackendDeclaration,
}

/// Where a child resource's market lives
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MarketRef {
    Declared(String),
    Configured(MarketBackendConfiguration),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProducerSpec {
    pub name: String,
    pub market: MarketRef,
    #[serde(flatten)]
    pub args: ProducerArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub market: MarketRef,
    pub producer: String,
    #[serde(flatten)]
    pub args: DatasetArgs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Program {
    #[serde(default, rename = "market")]
    pub markets: Vec<MarketSpec>,
    #[serde(default, rename = "producer")]
    pub producers: Vec<ProducerSpec>,
    #[serde(default, rename = "dataset")]
    pub datasets: Vec<DatasetSpec>,
}

impl Program {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MarketError::Config(e.to_string()))
    }

    /// Declare every resource and collect outputs keyed by `{kind}/{name}`
    pub async fn run(&self, registry: &BackendRegistry) -> Result<BTreeMap<String, Outputs>> {
        let mut outputs = BTreeMap::new();
        let mut markets: BTreeMap<&str, MarketBackendConfiguration> = BTreeMap::new();

        for spec in &self.markets {
            let market =
                MarketResource::declare(registry, &spec.name, spec.declaration.clone().into())
                    .await?;
            outputs.insert(format!("market/{}", spec.name), market.outputs()?);
            markets.insert(&spec.name, market.backend_configuration().clone());
        }

        for spec in &self.producers {
            let configuration = resolve(&markets, &spec.market);
            let producer =
                ProducerResource::declare(registry, &spec.name, configuration, spec.args.clone())
                    .await?;
            outputs.insert(format!("producer/{}", spec.name), producer.outputs()?);
        }

        for spec in &self.datasets {
            let configuration = resolve(&markets, &spec.market);
            let dataset = DatasetResource::declare(
                registry,
                &spec.name,
                configuration,
                &spec.producer,
                spec.args.clone(),
            )
            .await?;
            outputs.insert(
                format!("dataset/{}/{}", spec.producer, spec.name),
                dataset.outputs()?,
            );
        }

        info!(resources = outputs.len(), "Program complete");
        Ok(outputs)
    }
}

/// A name that no market in this program declared is an unresolved input
fn resolve(
    markets: &BTreeMap<&str, MarketBackendConfiguration>,
    market: &MarketRef,
) -> Input<MarketBackendConfiguration> {
    match market {
        MarketRef::Declared(name) => markets
            .get(name.as_str())
            .cloned()
            .map_or(Input::Unknown, Input::Known),
        MarketRef::Configured(configuration) => Input::Known(configuration.clone()),
    }
}
