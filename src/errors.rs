//! Error types for Shopkeeper
//!
//! Provides structured error handling using thiserror for every failure a
//! market declaration or metadata read can hit: registry lookups, metadata
//! validation, object storage operations and configuration loading.

use thiserror::Error;

/// Main error type for Shopkeeper operations
#[derive(Error, Debug)]
pub enum MarketError {
    /// No backend is registered under the requested type identifier
    #[error("Unknown backend: {backend_type}")]
    UnknownBackend { backend_type: String },

    /// The backend exists but does not accept this type identifier
    #[error("Backend type {backend_type} not supported by {backend}")]
    UnsupportedBackendType {
        backend_type: String,
        backend: &'static str,
    },

    /// Stored market metadata does not match the configuration used to connect
    #[error("Backend configuration {supplied} does not match saved market data {stored}")]
    ConfigurationMismatch { supplied: String, stored: String },

    /// Metadata document not present in the store
    #[error("Object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    /// Stored text could not be parsed into the expected document shape
    #[error("Malformed metadata: {source}")]
    MalformedMetadata {
        #[source]
        source: serde_json::Error,
    },

    /// A resource input has not been resolved yet
    #[error("Input dependencies not yet implemented: {resource} received an unresolved input")]
    PendingInput { resource: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    /// Cloud control-plane operation failed (container creation, permissions)
    #[error("Provisioning error for {container}: {message}")]
    Provisioning { container: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MarketError {
    /// Map an object_store failure for `container/key`, keeping absence distinct
    pub(crate) fn from_store(error: object_store::Error, container: &str, key: &str) -> Self {
        match error {
            object_store::Error::NotFound { .. } => MarketError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            },
            other => MarketError::Storage(other),
        }
    }

    /// True when the error means the document does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, MarketError::NotFound { .. })
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MarketError>;
