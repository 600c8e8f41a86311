use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::context::CallContext;
use crate::error::{StoreError, StoreResult};
use crate::models::Sock;

/// Reject seed data a store must never serve: duplicate ids, negative or NaN
/// prices and negative counts.
pub fn validate_seed(socks: &[Sock]) -> StoreResult<()> {
    let mut ids = HashSet::with_capacity(socks.len());
    for sock in socks {
        if !ids.insert(sock.id.as_str()) {
            return Err(StoreError::Unavailable(format!(
                "duplicate sock id '{}' in seed data",
                sock.id
            )));
        }
        if sock.price.is_nan() || sock.price < 0.0 {
            return Err(StoreError::Unavailable(format!(
                "sock '{}' has invalid price {} in seed data",
                sock.id, sock.price
            )));
        }
        if sock.quantity < 0 {
            return Err(StoreError::Unavailable(format!(
                "sock '{}' has negative count {} in seed data",
                sock.id, sock.quantity
            )));
        }
    }
    Ok(())
}

/// Record store trait for socks
///
/// Implementations return complete result sets (no internal pagination),
/// enumerate records in a stable store order, and report a missing record as
/// `None` rather than an error. They should call [`CallContext::check`]
/// before any expensive work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SockStore: Send + Sync {
    /// Socks carrying every tag in `tags`; all socks when `tags` is empty
    async fn find_by_tags(&self, ctx: &CallContext, tags: &[String]) -> StoreResult<Vec<Sock>>;

    /// Sock with exactly this identifier
    async fn find_by_id(&self, ctx: &CallContext, id: &str) -> StoreResult<Option<Sock>>;

    /// Every tag attached to at least one sock
    async fn all_tags(&self, ctx: &CallContext) -> StoreResult<Vec<String>>;

    /// Cheap connectivity check used by health probes
    async fn ping(&self, ctx: &CallContext) -> StoreResult<()>;
}

#[async_trait]
impl<T: SockStore + ?Sized> SockStore for Arc<T> {
    async fn find_by_tags(&self, ctx: &CallContext, tags: &[String]) -> StoreResult<Vec<Sock>> {
        (**self).find_by_tags(ctx, tags).await
    }

    async fn find_by_id(&self, ctx: &CallContext, id: &str) -> StoreResult<Option<Sock>> {
        (**self).find_by_id(ctx, id).await
    }

    async fn all_tags(&self, ctx: &CallContext) -> StoreResult<Vec<String>> {
        (**self).all_tags(ctx).await
    }

    async fn ping(&self, ctx: &CallContext) -> StoreResult<()> {
        (**self).ping(ctx).await
    }
}
