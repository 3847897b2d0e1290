//! Request-scoped cancellation and deadlines
//!
//! Every framework call receives a [`Context`]. Remote calls made on behalf of
//! a request should race against [`Context::cancelled`] so that a cancelled
//! operation or an expired deadline aborts the in-flight work.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

/// Context carries the cancellation signal and deadline of a single request
/// CRITICAL: Pass this as first parameter to ALL async trait methods
#[derive(Clone)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Arc<watch::Sender<bool>>,
}

/// Why a context stopped accepting work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::Cancelled => write!(f, "context cancelled"),
            ContextError::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl Context {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            deadline: None,
            cancel: Arc::new(cancel),
        }
    }

    /// Derives a context that also expires after `timeout`.
    ///
    /// The derived context shares the cancellation signal of its parent and
    /// keeps the earlier of the two deadlines.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };

        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Returns why the context is done, or None while work may continue
    pub fn err(&self) -> Option<ContextError> {
        if *self.cancel.borrow() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Completes once the context is cancelled or its deadline passes
    pub async fn cancelled(&self) {
        let mut done = self.cancel.subscribe();
        let signalled = async move {
            // the sender lives as long as `self`, so this only returns on cancel
            let _ = done.wait_for(|cancelled| *cancelled).await;
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signalled => {}
                    _ = time::sleep_until(deadline.into()) => {}
                }
            }
            None => signalled.await,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn context_timeout_cancels() {
        let ctx = Context::new().with_timeout(Duration::from_millis(100));

        assert!(!ctx.is_cancelled());

        sleep(Duration::from_millis(150)).await;

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[test]
    fn cancelled_is_pending_until_cancel() {
        let ctx = Context::new();
        let mut waiting = tokio_test::task::spawn(ctx.cancelled());

        tokio_test::assert_pending!(waiting.poll());

        ctx.cancel();

        assert!(waiting.is_woken());
        tokio_test::assert_ready!(waiting.poll());
    }

    #[tokio::test]
    async fn context_manual_cancel() {
        let ctx = Context::new();

        assert!(!ctx.is_cancelled());

        ctx.cancel();

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn context_deadline() {
        let ctx = Context::new();
        assert!(ctx.deadline().is_none());

        let ctx_with_timeout = ctx.with_timeout(Duration::from_secs(1));
        assert!(ctx_with_timeout.deadline().is_some());
    }

    #[tokio::test]
    async fn derived_context_keeps_earlier_deadline() {
        let short = Context::new().with_timeout(Duration::from_secs(1));
        let long = short.with_timeout(Duration::from_secs(60));

        assert_eq!(short.deadline(), long.deadline());
    }

    #[tokio::test]
    async fn cancelling_parent_cancels_derived_context() {
        let parent = Context::new();
        let child = parent.with_timeout(Duration::from_secs(60));

        parent.cancel();

        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn cancelled_future_resolves_on_cancel() {
        let ctx = Context::new();
        let waiter = ctx.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        ctx.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_future_resolves_on_deadline() {
        let ctx = Context::new().with_timeout(Duration::from_millis(20));

        tokio::time::timeout(Duration::from_secs(1), ctx.cancelled())
            .await
            .expect("deadline should end the wait");
    }
}
