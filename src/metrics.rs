//! Prometheus metrics for Shopkeeper
//!
//! Defines metrics for:
//! - Store operation counts by operation and status
//! - Store operation latency
//! - Resource declarations by resource kind and backend type

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

use crate::errors::Result;

lazy_static! {
    /// Registry for all metrics
    pub static ref REGISTRY: Registry = Registry::new();

    /// Store operation counter by operation and status
    pub static ref STORE_OPERATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("shopkeeper_store_operations_total", "Total store operations"),
        &["operation", "status"]
    )
    .expect("Failed to create STORE_OPERATIONS metric");

    /// Store operation duration histogram
    pub static ref STORE_OPERATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "shopkeeper_store_operation_duration_seconds",
            "Store operation duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .expect("Failed to create STORE_OPERATION_DURATION metric");

    /// Declarations by resource kind and backend type
    pub static ref DECLARATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("shopkeeper_declarations_total", "Total resource declarations"),
        &["resource", "backend_type"]
    )
    .expect("Failed to create DECLARATIONS metric");
}

/// Register all metrics with the global registry
pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(STORE_OPERATIONS.clone()))?;
    REGISTRY.register(Box::new(STORE_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(DECLARATIONS.clone()))?;
    Ok(())
}

/// Encode the registry in prometheus text format
pub fn render() -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Record the outcome and latency of one store operation
pub(crate) fn observe_store<T>(operation: &str, started: Instant, result: &Result<T>) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) if e.is_not_found() => "not_found",
        Err(_) => "error",
    };
    STORE_OPERATIONS.with_label_values(&[operation, status]).inc();
    STORE_OPERATION_DURATION.observe(started.elapsed().as_secs_f64());
}

pub(crate) fn record_declaration(resource: &str, backend_type: &str) {
    DECLARATIONS.with_label_values(&[resource, backend_type]).inc();
}
