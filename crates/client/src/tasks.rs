//! Detached background work.
//!
//! Revalidations are fire-and-forget for the request that triggers them,
//! but they still run on a tracked [`JoinSet`] so shutdown (and tests) can
//! wait for in-flight work instead of abandoning it.
//!
//! Dropping a [`BackgroundTasks::drain`] future before it completes aborts
//! the tasks it had taken over; tasks spawned after that point are unaffected.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{JoinError, JoinSet};

/// Tracks detached tasks spawned on the current tokio runtime.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    set: Mutex<JoinSet<()>>,
    running: Arc<AtomicUsize>,
}

/// Counts a task as running until its future is dropped, whether it
/// finished, panicked or was aborted.
struct RunningGuard(Arc<AtomicUsize>);

impl RunningGuard {
    fn enter(running: &Arc<AtomicUsize>) -> Self {
        running.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(running))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `task` without waiting for it.
    ///
    /// Must be called from within a tokio runtime. Finished tasks are reaped
    /// on each call so the set does not grow without bound.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.lock();
        while let Some(result) = set.try_join_next() {
            log_join(result);
        }
        let guard = RunningGuard::enter(&self.running);
        set.spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    /// Number of spawned tasks that have not finished yet, including tasks
    /// currently being awaited by [`Self::drain`].
    pub fn in_flight(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait for every tracked task, including tasks spawned while draining.
    pub async fn drain(&self) {
        loop {
            let mut set = std::mem::take(&mut *self.lock());
            if set.is_empty() {
                return;
            }
            while let Some(result) = set.join_next().await {
                log_join(result);
            }
        }
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result
        && e.is_panic()
    {
        tracing::error!(error = %e, "background task panicked");
    }
}
