//! Observability utilities for the catalogue service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Catalogue operation and dependency metrics
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, CatalogueMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics()?;
//!
//! CatalogueMetrics::set_catalogue_size(9);
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod catalogue;
pub mod middleware;

pub use catalogue::{CatalogueMetrics, OperationTimer};
pub use middleware::metrics_middleware;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Safe to call more than once; only the first call installs a recorder.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();
        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Catalogue metrics
    describe_counter!(
        "catalogue_operations_total",
        "Catalogue service calls by method and outcome"
    );
    describe_histogram!(
        "catalogue_operation_duration_seconds",
        "Catalogue service call duration in seconds"
    );
    describe_histogram!(
        "catalogue_results_returned",
        "Items returned per catalogue call"
    );
    describe_gauge!(
        "catalogue_dependency_up",
        "Whether a dependency passed its last health probe"
    );
    describe_gauge!(
        "catalogue_dependency_latency_ms",
        "Latency of the last health probe per dependency"
    );
    describe_gauge!("catalogue_socks_total", "Socks loaded at startup");
}
