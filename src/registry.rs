//! Backend registry
//!
//! Maps backend type identifiers (`object-store:v1`, `local:v1`, ...) to the
//! factory that serves them. Built once at startup and passed by reference to
//! the resource wrappers.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::backend::{MarketBackend, MarketBackendFactory};
use crate::errors::{MarketError, Result};
use crate::model::MarketBackendConfiguration;

#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn MarketBackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `backend_type` with a factory, replacing any previous entry
    pub fn register(&mut self, backend_type: impl Into<String>, factory: Arc<dyn MarketBackendFactory>) {
        let backend_type = backend_type.into();
        debug!(backend_type = %backend_type, backend = factory.name(), "Registering backend");
        self.backends.insert(backend_type, factory);
    }

    /// Register a factory under every type it supports
    pub fn register_factory(&mut self, factory: Arc<dyn MarketBackendFactory>) {
        for backend_type in factory.supported_types() {
            self.register(*backend_type, factory.clone());
        }
    }

    pub fn get(&self, backend_type: &str) -> Result<Arc<dyn MarketBackendFactory>> {
        self.backends
            .get(backend_type)
            .cloned()
            .ok_or_else(|| MarketError::UnknownBackend {
                backend_type: backend_type.to_string(),
            })
    }

    /// Look up the configuration's backend and reconnect to the market
    pub async fn connect(
        &self,
        configuration: &MarketBackendConfiguration,
    ) -> Result<Arc<dyn MarketBackend>> {
        self.get(&configuration.backend_type)?
            .reconnect(configuration)
            .await
    }

    /// Registered type identifiers, sorted
    pub fn backend_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}
