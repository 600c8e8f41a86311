//! Service decorators: structured logging and Prometheus metrics.
//!
//! Both wrap any [`CatalogueService`] and implement it themselves, so they
//! stack in either order and are invisible to callers.

use async_trait::async_trait;
use observability::{CatalogueMetrics, OperationTimer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::context::CallContext;
use crate::error::{CatalogueError, CatalogueResult};
use crate::models::{HealthFact, ListQuery, Sock};
use crate::service::CatalogueService;

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Logs every call with its inputs, elapsed time and error, if any.
///
/// Results and errors are passed through untouched.
pub struct LoggingCatalogue<S: CatalogueService + ?Sized> {
    inner: Arc<S>,
}

impl<S: CatalogueService + ?Sized> LoggingCatalogue<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self { inner }
    }
}

impl<S: CatalogueService + ?Sized> Clone for LoggingCatalogue<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<S: CatalogueService + ?Sized> CatalogueService for LoggingCatalogue<S> {
    async fn list(&self, ctx: &CallContext, query: ListQuery) -> CatalogueResult<Vec<Sock>> {
        let started = Instant::now();
        let tags = query.tags.join(",");
        let order = query.order.to_string();
        let (page_num, page_size) = (query.page_num, query.page_size);

        let result = self.inner.list(ctx, query).await;
        let took_ms = elapsed_ms(started);

        match &result {
            Ok(socks) => info!(
                method = "List",
                tags = %tags,
                order = %order,
                page_num,
                page_size,
                result = socks.len(),
                took_ms,
                "catalogue call"
            ),
            Err(e) => warn!(
                method = "List",
                tags = %tags,
                order = %order,
                page_num,
                page_size,
                took_ms,
                error = %e,
                "catalogue call failed"
            ),
        }
        result
    }

    async fn count(&self, ctx: &CallContext, tags: &[String]) -> CatalogueResult<usize> {
        let started = Instant::now();
        let result = self.inner.count(ctx, tags).await;
        let took_ms = elapsed_ms(started);
        let tags = tags.join(",");

        match &result {
            Ok(n) => info!(method = "Count", tags = %tags, result = n, took_ms, "catalogue call"),
            Err(e) => warn!(method = "Count", tags = %tags, took_ms, error = %e, "catalogue call failed"),
        }
        result
    }

    async fn get(&self, ctx: &CallContext, id: &str) -> CatalogueResult<Sock> {
        let started = Instant::now();
        let result = self.inner.get(ctx, id).await;
        let took_ms = elapsed_ms(started);

        match &result {
            Ok(_) => info!(method = "Get", id, took_ms, "catalogue call"),
            Err(e) => warn!(method = "Get", id, took_ms, error = %e, "catalogue call failed"),
        }
        result
    }

    async fn tags(&self, ctx: &CallContext) -> CatalogueResult<Vec<String>> {
        let started = Instant::now();
        let result = self.inner.tags(ctx).await;
        let took_ms = elapsed_ms(started);

        match &result {
            Ok(tags) => info!(method = "Tags", result = tags.len(), took_ms, "catalogue call"),
            Err(e) => warn!(method = "Tags", took_ms, error = %e, "catalogue call failed"),
        }
        result
    }

    async fn health(&self, ctx: &CallContext) -> Vec<HealthFact> {
        let started = Instant::now();
        let facts = self.inner.health(ctx).await;
        let took_ms = elapsed_ms(started);
        let unhealthy = facts.iter().filter(|f| !f.is_healthy()).count();

        if unhealthy == 0 {
            info!(method = "Health", result = facts.len(), took_ms, "catalogue call");
        } else {
            warn!(
                method = "Health",
                result = facts.len(),
                unhealthy,
                took_ms,
                "catalogue call reported unhealthy dependencies"
            );
        }
        facts
    }
}

/// Records call counts, latencies and result sizes as Prometheus metrics.
pub struct InstrumentedCatalogue<S: CatalogueService + ?Sized> {
    inner: Arc<S>,
}

impl<S: CatalogueService + ?Sized> InstrumentedCatalogue<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self { inner }
    }
}

impl<S: CatalogueService + ?Sized> Clone for InstrumentedCatalogue<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn outcome<T>(result: &CatalogueResult<T>) -> &'static str {
    result.as_ref().map_or_else(CatalogueError::kind, |_| "ok")
}

#[async_trait]
impl<S: CatalogueService + ?Sized> CatalogueService for InstrumentedCatalogue<S> {
    async fn list(&self, ctx: &CallContext, query: ListQuery) -> CatalogueResult<Vec<Sock>> {
        let timer = OperationTimer::start("list");
        let result = self.inner.list(ctx, query).await;
        timer.finish(outcome(&result));
        if let Ok(socks) = &result {
            CatalogueMetrics::record_results("list", socks.len());
        }
        result
    }

    async fn count(&self, ctx: &CallContext, tags: &[String]) -> CatalogueResult<usize> {
        let timer = OperationTimer::start("count");
        let result = self.inner.count(ctx, tags).await;
        timer.finish(outcome(&result));
        result
    }

    async fn get(&self, ctx: &CallContext, id: &str) -> CatalogueResult<Sock> {
        let timer = OperationTimer::start("get");
        let result = self.inner.get(ctx, id).await;
        timer.finish(outcome(&result));
        result
    }

    async fn tags(&self, ctx: &CallContext) -> CatalogueResult<Vec<String>> {
        let timer = OperationTimer::start("tags");
        let result = self.inner.tags(ctx).await;
        timer.finish(outcome(&result));
        if let Ok(tags) = &result {
            CatalogueMetrics::record_results("tags", tags.len());
        }
        result
    }

    async fn health(&self, ctx: &CallContext) -> Vec<HealthFact> {
        let timer = OperationTimer::start("health");
        let facts = self.inner.health(ctx).await;
        timer.finish("ok");
        for fact in &facts {
            CatalogueMetrics::set_dependency_up(&fact.service, fact.is_healthy());
            CatalogueMetrics::set_dependency_latency(&fact.service, fact.latency_ms);
        }
        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogueError;
    use crate::models::HealthStatus;
    use crate::service::MockCatalogueService;
    use chrono::Utc;
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn sock(id: &str) -> Sock {
        Sock {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            image_urls: vec![],
            price: 1.0,
            quantity: 1,
            tags: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_logging_passes_results_through() {
        let mut mock = MockCatalogueService::new();
        mock.expect_list()
            .withf(|_, q| q.page_num == 2 && q.page_size == 5)
            .times(1)
            .returning(|_, _| Ok(vec![sock("a"), sock("b")]));
        mock.expect_count().returning(|_, _| Ok(7));

        let logged = LoggingCatalogue::new(Arc::new(mock));
        let ctx = CallContext::new();

        let socks = logged
            .list(&ctx, ListQuery::default().page(2, 5))
            .await
            .unwrap();
        assert_eq!(socks, vec![sock("a"), sock("b")]);
        assert_eq!(logged.count(&ctx, &["red".into()]).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_logging_keeps_error_identity() {
        let mut mock = MockCatalogueService::new();
        mock.expect_get()
            .returning(|_, id| Err(CatalogueError::NotFound(id.to_string())));
        mock.expect_tags().returning(|_| {
            Err(CatalogueError::StoreUnavailable {
                operation: "tags",
                message: "down".into(),
            })
        });

        let logged = LoggingCatalogue::new(Arc::new(mock));
        let ctx = CallContext::new();

        assert_eq!(
            logged.get(&ctx, "missing-id").await.unwrap_err(),
            CatalogueError::NotFound("missing-id".into())
        );
        assert_eq!(
            logged.tags(&ctx).await.unwrap_err(),
            CatalogueError::StoreUnavailable {
                operation: "tags",
                message: "down".into()
            }
        );
    }

    #[tokio::test]
    async fn test_decorators_stack() {
        let mut mock = MockCatalogueService::new();
        mock.expect_health().returning(|_| {
            vec![HealthFact {
                service: "catalogue-db".into(),
                status: HealthStatus::Unhealthy,
                latency_ms: 2.0,
                time: Utc::now(),
                error: Some("timeout".into()),
            }]
        });
        mock.expect_get()
            .returning(|_, _| Err(CatalogueError::DeadlineExceeded { operation: "get" }));

        let stacked = LoggingCatalogue::new(Arc::new(InstrumentedCatalogue::new(Arc::new(mock))));
        let ctx = CallContext::new();

        let facts = stacked.health(&ctx).await;
        assert_eq!(facts.len(), 1);
        assert!(!facts[0].is_healthy());

        assert_eq!(
            stacked.get(&ctx, "x").await.unwrap_err(),
            CatalogueError::DeadlineExceeded { operation: "get" }
        );
    }

    #[test]
    fn test_instrumented_emits_operation_series() {
        let mut mock = MockCatalogueService::new();
        mock.expect_list()
            .returning(|_, _| Ok(vec![sock("a"), sock("b")]));
        mock.expect_get()
            .returning(|_, id| Err(CatalogueError::NotFound(id.to_string())));
        mock.expect_count().returning(|_, _| {
            Err(CatalogueError::StoreUnavailable {
                operation: "count",
                message: "down".into(),
            })
        });
        mock.expect_health().returning(|_| {
            vec![
                HealthFact {
                    service: "catalogue".into(),
                    status: HealthStatus::Healthy,
                    latency_ms: 0.5,
                    time: Utc::now(),
                    error: None,
                },
                HealthFact {
                    service: "catalogue-db".into(),
                    status: HealthStatus::Unhealthy,
                    latency_ms: 4.0,
                    time: Utc::now(),
                    error: Some("timeout".into()),
                },
            ]
        });

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let instrumented = InstrumentedCatalogue::new(Arc::new(mock));

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let ctx = CallContext::new();
                instrumented.list(&ctx, ListQuery::default()).await.unwrap();
                instrumented.get(&ctx, "missing").await.unwrap_err();
                instrumented.count(&ctx, &[]).await.unwrap_err();
                instrumented.health(&ctx).await;
            })
        });

        let rendered = handle.render();
        for line in [
            r#"catalogue_operations_total{method="list",outcome="ok"} 1"#,
            r#"catalogue_operations_total{method="get",outcome="not_found"} 1"#,
            r#"catalogue_operations_total{method="count",outcome="store_unavailable"} 1"#,
            r#"catalogue_operations_total{method="health",outcome="ok"} 1"#,
            r#"catalogue_operation_duration_seconds_count{method="list"} 1"#,
            r#"catalogue_results_returned_sum{method="list"} 2"#,
            r#"catalogue_dependency_up{service="catalogue"} 1"#,
            r#"catalogue_dependency_up{service="catalogue-db"} 0"#,
            r#"catalogue_dependency_latency_ms{service="catalogue-db"} 4"#,
        ] {
            assert!(rendered.contains(line), "missing `{}` in:\n{}", line, rendered);
        }
        assert!(!rendered.contains(r#"catalogue_results_returned_count{method="get"}"#));
    }

    #[test]
    fn test_outcome_labels() {
        let ok: CatalogueResult<()> = Ok(());
        let missing: CatalogueResult<()> = Err(CatalogueError::NotFound("x".into()));
        assert_eq!(outcome(&ok), "ok");
        assert_eq!(outcome(&missing), "not_found");
    }
}
