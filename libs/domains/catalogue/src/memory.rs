//! In-memory sock store, seeded once and never mutated.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::context::CallContext;
use crate::error::StoreResult;
use crate::models::Sock;
use crate::repository::{validate_seed, SockStore};

/// Store backed by an immutable, shared slice of socks.
///
/// Enumeration order is the order the socks were supplied in.
#[derive(Clone, Debug)]
pub struct MemorySockStore {
    socks: Arc<[Sock]>,
}

impl Default for MemorySockStore {
    fn default() -> Self {
        Self {
            socks: Arc::from(Vec::new()),
        }
    }
}

impl MemorySockStore {
    /// Build a store after [`validate_seed`] accepts `socks`.
    pub fn new(socks: Vec<Sock>) -> StoreResult<Self> {
        validate_seed(&socks)?;

        Ok(Self {
            socks: socks.into(),
        })
    }

    /// Parse a JSON array of socks.
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let socks: Vec<Sock> = serde_json::from_str(json)?;
        Self::new(socks)
    }

    /// Load a JSON array of socks from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&json)?;
        info!(path = %path.display(), socks = store.len(), "Loaded catalogue seed");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.socks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.socks.is_empty()
    }

    /// All socks in store order.
    pub fn socks(&self) -> &[Sock] {
        &self.socks
    }
}

#[async_trait]
impl SockStore for MemorySockStore {
    async fn find_by_tags(&self, ctx: &CallContext, tags: &[String]) -> StoreResult<Vec<Sock>> {
        ctx.check()?;
        Ok(self
            .socks
            .iter()
            .filter(|sock| sock.has_all_tags(tags))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, ctx: &CallContext, id: &str) -> StoreResult<Option<Sock>> {
        ctx.check()?;
        Ok(self.socks.iter().find(|sock| sock.id == id).cloned())
    }

    async fn all_tags(&self, ctx: &CallContext) -> StoreResult<Vec<String>> {
        ctx.check()?;
        let tags: BTreeSet<&String> = self.socks.iter().flat_map(|sock| &sock.tags).collect();
        Ok(tags.into_iter().cloned().collect())
    }

    async fn ping(&self, ctx: &CallContext) -> StoreResult<()> {
        ctx.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    const SEED: &str = r#"[
        {"id": "a", "name": "A", "price": 10.0, "count": 3, "tag": ["red", "wool"]},
        {"id": "b", "name": "B", "price": 5.0, "count": 1, "tag": ["red"]},
        {"id": "c", "name": "C", "price": 7.5, "count": 0, "tag": ["wool"]},
        {"id": "d", "name": "D", "price": 1.0}
    ]"#;

    #[tokio::test]
    async fn test_find_by_tags_uses_intersection() {
        let store = MemorySockStore::from_json_str(SEED).unwrap();
        let ctx = CallContext::new();

        let all = store.find_by_tags(&ctx, &[]).await.unwrap();
        assert_eq!(all.len(), 4);

        let red = store.find_by_tags(&ctx, &["red".into()]).await.unwrap();
        let ids: Vec<_> = red.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);

        let both = store
            .find_by_tags(&ctx, &["red".into(), "wool".into()])
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, "a");
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = MemorySockStore::from_json_str(SEED).unwrap();
        let ctx = CallContext::new();
        assert_eq!(store.find_by_id(&ctx, "c").await.unwrap().unwrap().name, "C");
        assert!(store.find_by_id(&ctx, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_tags_is_distinct_union() {
        let store = MemorySockStore::from_json_str(SEED).unwrap();
        let tags = store.all_tags(&CallContext::new()).await.unwrap();
        assert_eq!(tags, vec!["red".to_string(), "wool".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemorySockStore::default();
        let ctx = CallContext::new();
        assert!(store.is_empty());
        assert!(store.find_by_tags(&ctx, &[]).await.unwrap().is_empty());
        assert!(store.all_tags(&ctx).await.unwrap().is_empty());
        assert!(store.ping(&ctx).await.is_ok());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[{"id": "a", "name": "A", "price": 1.0}, {"id": "a", "name": "B", "price": 2.0}]"#;
        let err = MemorySockStore::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_invalid_price_or_count_is_rejected() {
        let seed = || -> Vec<Sock> { serde_json::from_str(SEED).unwrap() };

        let mut socks = seed();
        socks[1].price = -0.5;
        let err = MemorySockStore::new(socks).unwrap_err();
        assert!(err.to_string().contains("'b' has invalid price"));

        let mut socks = seed();
        socks[2].price = f64::NAN;
        let err = MemorySockStore::new(socks).unwrap_err();
        assert!(err.to_string().contains("'c' has invalid price NaN"));

        let mut socks = seed();
        socks[0].quantity = -1;
        let err = MemorySockStore::new(socks).unwrap_err();
        assert!(err.to_string().contains("'a' has negative count"));

        let json = r#"[{"id": "a", "name": "A", "price": 1.0, "count": -3}]"#;
        assert!(MemorySockStore::from_json_str(json).is_err());
    }

    #[test]
    fn test_free_and_out_of_stock_socks_are_accepted() {
        let mut socks: Vec<Sock> = serde_json::from_str(SEED).unwrap();
        socks[0].price = 0.0;
        socks[0].quantity = 0;
        assert_eq!(MemorySockStore::new(socks).unwrap().len(), 4);
    }

    #[test]
    fn test_malformed_seed_is_a_store_error() {
        let err = MemorySockStore::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let store = MemorySockStore::from_json_str(SEED).unwrap();
        let ctx = CallContext::new();
        ctx.cancel();
        assert_eq!(
            store.find_by_tags(&ctx, &[]).await.unwrap_err(),
            StoreError::Cancelled
        );
    }
}
