//! Bounded asynchronous write execution.
//!
//! All durable writes go through one `WriteExecutor`: `submit` hands the
//! unit of work a connection for its exclusive duration and returns a
//! `WriteHandle` future immediately — the caller never blocks. Concurrency
//! is bounded by a semaphore sized from configuration; excess submissions
//! queue. The executor never retries: one failure surfaces once, through
//! the handle and (if attached) the task's observer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tokio::sync::{Semaphore, oneshot};

use crate::error::StoreError;
use crate::observer::ObservedTask;

/// Boxed future produced by a unit of work.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send>>;

/// Future resolving to the outcome of one submitted write.
///
/// Resolves exactly once; dropping the handle does not cancel the write.
pub struct WriteHandle<T> {
    rx: oneshot::Receiver<Result<T, StoreError>>,
}

impl<T> WriteHandle<T> {
    /// A handle that is already resolved. Used for failures detected before
    /// submission, which must still surface through the future rather than
    /// a synchronous panic or return.
    pub(crate) fn ready(result: Result<T, StoreError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl<T> Future for WriteHandle<T> {
    type Output = Result<T, StoreError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx).map(|received| match received {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::ExecutionFailed(
                "write task dropped without reporting an outcome".to_string(),
            )),
        })
    }
}

/// Submits units of work against the store's connection, at most `workers`
/// at a time.
pub struct WriteExecutor {
    conn: libsql::Connection,
    permits: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
}

impl WriteExecutor {
    #[must_use]
    pub fn new(conn: libsql::Connection, workers: usize) -> Self {
        Self {
            conn,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Submit one unit of work without an observer.
    pub fn submit<T, F>(&self, task: F) -> WriteHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(libsql::Connection) -> TaskFuture<T> + Send + 'static,
    {
        self.submit_observed(task, ObservedTask::unobserved())
    }

    /// Submit one unit of work wrapped with an observer.
    ///
    /// The observer receives exactly one terminal callback: `finished` on
    /// success, `failed` if the task fails (the failure also propagates
    /// through the handle), `aborted` if the executor shuts down before the
    /// task starts. If the executor is already closed, the task is never
    /// invoked: `failed` fires and the handle resolves to `IllegalState`.
    pub fn submit_observed<T, F>(&self, task: F, observed: ObservedTask<T>) -> WriteHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(libsql::Connection) -> TaskFuture<T> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            let err = StoreError::IllegalState("executor is closed, no connection available".to_string());
            observed.error(&err.to_string());
            return WriteHandle::ready(Err(err));
        }

        let (tx, rx) = oneshot::channel();
        let conn = self.conn.clone();
        let permits = Arc::clone(&self.permits);
        let closed = Arc::clone(&self.closed);

        tokio::spawn(async move {
            // Queued here until a worker slot frees up.
            let Ok(_permit) = permits.acquire().await else {
                observed.abort();
                let _ = tx.send(Err(StoreError::Canceled(
                    "executor shut down before the task started".to_string(),
                )));
                return;
            };
            if closed.load(Ordering::Acquire) {
                observed.abort();
                let _ = tx.send(Err(StoreError::Canceled(
                    "executor shut down before the task started".to_string(),
                )));
                return;
            }

            // The connection is this task's alone until the future resolves.
            match task(conn).await {
                Ok(value) => {
                    observed.finish(&value);
                    let _ = tx.send(Ok(value));
                }
                Err(err) => {
                    observed.error(&err.to_string());
                    let _ = tx.send(Err(err));
                }
            }
        });

        WriteHandle { rx }
    }

    /// Stop accepting work. In-flight writes complete; queued tasks abort.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.permits.close();
        tracing::debug!("write executor closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
