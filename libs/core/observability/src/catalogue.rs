//! Catalogue-specific metrics.

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Catalogue metrics recorder
pub struct CatalogueMetrics;

impl CatalogueMetrics {
    /// Record one finished service call.
    ///
    /// `outcome` is `ok` or an error kind such as `not_found`.
    pub fn record_operation(method: &str, outcome: &str, duration: Duration) {
        counter!(
            "catalogue_operations_total",
            "method" => method.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
        histogram!("catalogue_operation_duration_seconds", "method" => method.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record how many socks (or tags) a call returned
    pub fn record_results(method: &str, count: usize) {
        histogram!("catalogue_results_returned", "method" => method.to_string())
            .record(count as f64);
    }

    /// 1 when the dependency answered its last probe, 0 otherwise
    pub fn set_dependency_up(service: &str, healthy: bool) {
        gauge!("catalogue_dependency_up", "service" => service.to_string())
            .set(if healthy { 1.0 } else { 0.0 });
    }

    /// Last probe latency for a dependency
    pub fn set_dependency_latency(service: &str, latency_ms: f64) {
        gauge!("catalogue_dependency_latency_ms", "service" => service.to_string())
            .set(latency_ms);
    }

    /// Size of the catalogue loaded at startup
    pub fn set_catalogue_size(count: usize) {
        gauge!("catalogue_socks_total").set(count as f64);
    }
}

/// Measures one service call.
///
/// Nothing is recorded until [`finish`](Self::finish) is called, so a call
/// dropped mid-flight leaves no sample behind.
pub struct OperationTimer {
    start: Instant,
    method: &'static str,
}

impl OperationTimer {
    pub fn start(method: &'static str) -> Self {
        Self {
            start: Instant::now(),
            method,
        }
    }

    /// Record the call with its outcome and return the elapsed time.
    pub fn finish(self, outcome: &str) -> Duration {
        let elapsed = self.start.elapsed();
        CatalogueMetrics::record_operation(self.method, outcome, elapsed);
        elapsed
    }
}
