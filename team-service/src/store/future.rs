use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use super::{StoreError, StoreResult};

/// Single-shot handle to a store operation running on the tokio runtime.
///
/// Awaiting consumes the handle, so a result is observed at most once.
/// Dropping it before completion aborts the backing task.
#[must_use = "store operations run regardless, but their result is lost unless awaited"]
pub struct StoreFuture<T> {
    rx: oneshot::Receiver<StoreResult<T>>,
    task: Option<AbortHandle>,
}

impl<T: Send + 'static> StoreFuture<T> {
    /// Start `op` on the current runtime. Panics outside a tokio runtime.
    pub fn spawn<F>(op: F) -> Self
    where
        F: Future<Output = StoreResult<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            // The receiver may already be gone; nothing to deliver then.
            let _ = tx.send(op.await);
        });

        Self {
            rx,
            task: Some(handle.abort_handle()),
        }
    }

    /// A handle that is already complete. Used when arguments are rejected
    /// before any work is started.
    pub fn ready(result: StoreResult<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx, task: None }
    }
}

impl<T> Future for StoreFuture<T> {
    type Output = StoreResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(result) => {
                this.task = None;
                Poll::Ready(result.unwrap_or(Err(StoreError::Cancelled)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for StoreFuture<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> std::fmt::Debug for StoreFuture<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFuture")
            .field("pending", &self.task.is_some())
            .finish()
    }
}
