//! Task spawning abstraction.
//!
//! The bridge is started either by the standalone server, which owns its
//! Tokio runtime, or from inside a host application that hands over a runtime
//! handle of its own. [`TaskSpawner`] lets the composition root start the
//! rebuild loop without caring which.

use std::future::Future;

/// Abstraction for spawning background tasks.
///
/// Implementations must keep spawned tasks running after the spawner itself
/// is dropped. Tasks stop through their `CancellationToken`, not through the
/// spawner.
///
/// # Example
///
/// ```ignore
/// spawner.spawn(async move {
///     sync.run(cancel).await;
/// });
/// ```
pub trait TaskSpawner: Send + Sync {
    /// Spawns a future as a detached background task.
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Spawner backed by a Tokio runtime handle.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Spawner for a runtime owned by someone else (e.g. the host application).
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawner for the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    #[must_use]
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn current_spawner_runs_task() {
        let (tx, rx) = oneshot::channel();
        TokioSpawner::current().spawn(async move {
            let _ = tx.send(7);
        });
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[test]
    fn foreign_runtime_handle_runs_task() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let spawner = TokioSpawner::new(runtime.handle().clone());
        let (tx, rx) = std::sync::mpsc::channel();

        spawner.spawn(async move {
            let _ = tx.send(());
        });
        assert!(rx.recv_timeout(std::time::Duration::from_secs(2)).is_ok());
    }
}
