//! Per-request call context carrying a deadline and a cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Explicit token threaded from handler to service to store.
///
/// Clones share the same cancellation state, so a handler can keep one copy
/// and cancel the call while the service and store hold others.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    state: Arc<CancelState>,
}

impl CallContext {
    /// A context with no deadline that is never cancelled unless asked.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            state: Arc::default(),
        }
    }

    /// `None` means no deadline.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::with_timeout).unwrap_or_default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel every call sharing this context.
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            self.state.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Stores call this before doing expensive work.
    pub fn check(&self) -> StoreResult<()> {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if self.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `call` until it finishes, the deadline passes or the context is
    /// cancelled, whichever comes first. Cancellation wins a tie.
    pub async fn bound<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        self.check()?;

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, call)
                    .await
                    .unwrap_or(Err(StoreError::DeadlineExceeded)),
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(StoreError::Cancelled),
            result = bounded => result,
        }
    }

    /// Cancels this context when the returned guard is dropped.
    ///
    /// Handlers hold the guard for the lifetime of the request, so a dropped
    /// request future cancels any work still sharing the context.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Guard returned by [`CallContext::cancel_on_drop`].
#[derive(Debug)]
pub struct CancelOnDrop(CallContext);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_active() {
        let ctx = CallContext::new();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = CallContext::new();
        let other = ctx.clone();
        other.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_expired_deadline_fails_check() {
        let ctx = CallContext::with_timeout(Duration::from_millis(0));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.check(), Err(StoreError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_after_cancel() {
        let ctx = CallContext::new();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }

    #[test]
    fn test_guard_cancels_on_drop() {
        let ctx = CallContext::new();
        {
            let _guard = ctx.cancel_on_drop();
            assert!(!ctx.is_cancelled());
        }
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_bound_stops_at_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(20));
        let result: StoreResult<()> = ctx
            .bound(async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(StoreError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_bound_stops_on_cancel() {
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let result: StoreResult<()> = ctx
            .bound(async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_bound_passes_through_result() {
        let ctx = CallContext::with_timeout(Duration::from_secs(1));
        assert_eq!(ctx.bound(async { Ok(7) }).await, Ok(7));
    }

    #[test]
    fn test_from_timeout_none_has_no_deadline() {
        assert!(CallContext::from_timeout(None).deadline().is_none());
        assert!(CallContext::from_timeout(Some(Duration::from_secs(5)))
            .deadline()
            .is_some());
    }
}
