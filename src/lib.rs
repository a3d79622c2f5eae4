//! Shopkeeper - metadata registry for data marketplaces
//!
//! A market is a storage container holding hierarchical metadata documents
//! for the producers and datasets registered in it. This crate derives the
//! document keys, encodes the documents, and dispatches declarations to a
//! pluggable storage backend (object storage or the local filesystem).

pub mod backend;
pub mod codec;
pub mod config;
pub mod errors;
pub mod keys;
pub mod metrics;
pub mod model;
pub mod program;
pub mod registry;
pub mod resource;
pub mod store;

pub use backend::{default_registry, MarketBackend, MarketBackendFactory};
pub use errors::{MarketError, Result};
pub use model::{
    DatasetArgs, DatasetData, MarketBackendConfiguration, MarketBackendDeclaration, MarketData,
    ProducerArgs, ProducerData,
};
pub use registry::BackendRegistry;
pub use resource::{DatasetResource, Input, MarketResource, ProducerResource};
