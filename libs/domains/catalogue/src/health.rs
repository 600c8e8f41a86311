//! Health aggregation over named dependency probes.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::context::CallContext;
use crate::models::{HealthFact, HealthStatus};
use crate::repository::SockStore;

/// Name reported for the service itself
pub const SERVICE_NAME: &str = "catalogue";

/// Name reported for the backing store
pub const STORE_NAME: &str = "catalogue-db";

/// One named dependency check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &CallContext) -> Result<(), String>;
}

/// The service answering at all is its own liveness signal.
pub struct ServiceProbe;

#[async_trait]
impl HealthProbe for ServiceProbe {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn check(&self, _ctx: &CallContext) -> Result<(), String> {
        Ok(())
    }
}

/// Pings a sock store.
pub struct StoreProbe<R: SockStore> {
    store: Arc<R>,
}

impl<R: SockStore> StoreProbe<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<R: SockStore> HealthProbe for StoreProbe<R> {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn check(&self, ctx: &CallContext) -> Result<(), String> {
        self.store.ping(ctx).await.map_err(|e| e.to_string())
    }
}

/// Runs every registered probe and reports one fact per probe.
///
/// Probes run concurrently; facts come back in registration order. A failing
/// probe yields an unhealthy fact, never an error. Each check is bounded by
/// the context, so a hung dependency reports `deadline exceeded` or
/// `request cancelled` instead of stalling the report.
#[derive(Clone, Default)]
pub struct HealthReporter {
    probes: Vec<Arc<dyn HealthProbe>>,
}

impl HealthReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe(mut self, probe: impl HealthProbe + 'static) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub async fn report(&self, ctx: &CallContext) -> Vec<HealthFact> {
        let checks = self.probes.iter().map(|probe| async move {
            let started = Instant::now();
            let outcome = ctx
                .bound(async { Ok(probe.check(ctx).await) })
                .await
                .unwrap_or_else(|e| Err(e.to_string()));
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            match outcome {
                Ok(()) => HealthFact {
                    service: probe.name().to_string(),
                    status: HealthStatus::Healthy,
                    latency_ms,
                    time: Utc::now(),
                    error: None,
                },
                Err(e) => {
                    warn!(service = probe.name(), error = %e, "Health probe failed");
                    HealthFact {
                        service: probe.name().to_string(),
                        status: HealthStatus::Unhealthy,
                        latency_ms,
                        time: Utc::now(),
                        error: Some(e),
                    }
                }
            }
        });

        join_all(checks).await
    }
}
