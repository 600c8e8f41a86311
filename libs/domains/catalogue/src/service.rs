//! Catalogue Service - query logic over a sock store

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

use crate::context::CallContext;
use crate::error::{CatalogueError, CatalogueResult, StoreResult};
use crate::health::{HealthProbe, HealthReporter, ServiceProbe, StoreProbe};
use crate::models::{HealthFact, ListQuery, Sock};
use crate::query::{normalize_tags, paginate, sort_socks};
use crate::repository::SockStore;

/// Read-only catalogue operations.
///
/// Decorators implement this same trait and forward to an inner service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueService: Send + Sync {
    /// Filter by tags (intersection), sort stably, then cut one page
    async fn list(&self, ctx: &CallContext, query: ListQuery) -> CatalogueResult<Vec<Sock>>;

    /// Number of socks `list` would return with paging disabled
    async fn count(&self, ctx: &CallContext, tags: &[String]) -> CatalogueResult<usize>;

    /// Exactly one sock, or `NotFound`
    async fn get(&self, ctx: &CallContext, id: &str) -> CatalogueResult<Sock>;

    /// Distinct tags across the whole store, sorted
    async fn tags(&self, ctx: &CallContext) -> CatalogueResult<Vec<String>>;

    /// One fact per probed dependency; never fails
    async fn health(&self, ctx: &CallContext) -> Vec<HealthFact>;
}

#[async_trait]
impl<T: CatalogueService + ?Sized> CatalogueService for Arc<T> {
    async fn list(&self, ctx: &CallContext, query: ListQuery) -> CatalogueResult<Vec<Sock>> {
        (**self).list(ctx, query).await
    }

    async fn count(&self, ctx: &CallContext, tags: &[String]) -> CatalogueResult<usize> {
        (**self).count(ctx, tags).await
    }

    async fn get(&self, ctx: &CallContext, id: &str) -> CatalogueResult<Sock> {
        (**self).get(ctx, id).await
    }

    async fn tags(&self, ctx: &CallContext) -> CatalogueResult<Vec<String>> {
        (**self).tags(ctx).await
    }

    async fn health(&self, ctx: &CallContext) -> Vec<HealthFact> {
        (**self).health(ctx).await
    }
}

/// Catalogue service over a [`SockStore`].
///
/// Holds no mutable state. Store failures are tagged with the operation and
/// returned immediately; nothing is retried here.
pub struct CatalogueServiceImpl<R: SockStore> {
    store: Arc<R>,
    health: HealthReporter,
}

impl<R: SockStore + 'static> CatalogueServiceImpl<R> {
    /// Create a service that reports on itself and on `store`
    pub fn new(store: R) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<R>) -> Self {
        let health = HealthReporter::new()
            .with_probe(ServiceProbe)
            .with_probe(StoreProbe::new(Arc::clone(&store)));

        Self { store, health }
    }

    /// Report on an additional dependency from `health`
    pub fn with_probe(mut self, probe: impl HealthProbe + 'static) -> Self {
        self.health = self.health.with_probe(probe);
        self
    }

    pub fn store(&self) -> &Arc<R> {
        &self.store
    }
}

impl<R: SockStore> Clone for CatalogueServiceImpl<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            health: self.health.clone(),
        }
    }
}

/// Run one store call under the context's cancellation and deadline.
async fn guarded<T, F>(ctx: &CallContext, operation: &'static str, call: F) -> CatalogueResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    ctx.bound(call)
        .await
        .map_err(|e| CatalogueError::from_store(operation, e))
}

#[async_trait]
impl<R: SockStore + 'static> CatalogueService for CatalogueServiceImpl<R> {
    #[instrument(skip(self, ctx), fields(order = %query.order))]
    async fn list(&self, ctx: &CallContext, query: ListQuery) -> CatalogueResult<Vec<Sock>> {
        let tags = normalize_tags(&query.tags);
        let mut socks = guarded(ctx, "list", self.store.find_by_tags(ctx, &tags)).await?;

        sort_socks(&mut socks, query.order);
        Ok(paginate(socks, query.page_num, query.page_size))
    }

    #[instrument(skip(self, ctx))]
    async fn count(&self, ctx: &CallContext, tags: &[String]) -> CatalogueResult<usize> {
        let tags = normalize_tags(tags);
        let socks = guarded(ctx, "count", self.store.find_by_tags(ctx, &tags)).await?;
        Ok(socks.len())
    }

    #[instrument(skip(self, ctx))]
    async fn get(&self, ctx: &CallContext, id: &str) -> CatalogueResult<Sock> {
        guarded(ctx, "get", self.store.find_by_id(ctx, id))
            .await?
            .ok_or_else(|| CatalogueError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, ctx))]
    async fn tags(&self, ctx: &CallContext) -> CatalogueResult<Vec<String>> {
        let mut tags = guarded(ctx, "tags", self.store.all_tags(ctx)).await?;
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    #[instrument(skip(self, ctx))]
    async fn health(&self, ctx: &CallContext) -> Vec<HealthFact> {
        self.health.report(ctx).await
    }
}
