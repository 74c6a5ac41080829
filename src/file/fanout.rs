//! Optional cap on concurrent filesystem calls.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Limits how many leaf filesystem calls one traversal keeps in flight.
///
/// Only leaf calls (stat, readdir, unlink, rmdir) take a permit; recursion
/// into subdirectories never holds one, so a small limit cannot deadlock a
/// deep tree. The default is unbounded.
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    semaphore: Option<Arc<Semaphore>>,
    limit: usize,
}

impl FanOut {
    /// No limit: every sibling is dispatched at once.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// At most `max` calls in flight; `0` means unbounded.
    pub fn bounded(max: usize) -> Self {
        if max == 0 {
            return Self::unbounded();
        }
        Self {
            semaphore: Some(Arc::new(Semaphore::new(max))),
            limit: max,
        }
    }

    /// Configured limit, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|_| self.limit)
    }

    /// Run `op` once a slot is free.
    pub async fn run<F: Future>(&self, op: F) -> F::Output {
        let _permit = match &self.semaphore {
            // The semaphore is never closed, so acquire only fails if that changes.
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        };
        op.await
    }
}
