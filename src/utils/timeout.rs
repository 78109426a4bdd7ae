//! Bounded concurrent execution with a wall-clock deadline per task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::hub::HubError;

/// Wall-clock deadline applied to each submitted task
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of tasks running at once
pub const DEFAULT_MAX_WORKERS: usize = 2;

/// Runs async tasks on a bounded pool, abandoning results that miss the
/// deadline.
///
/// Submission blocks while all worker slots are busy. A task that exceeds
/// the deadline keeps running in the background until it finishes on its
/// own (its worker slot stays occupied until then), but its result is
/// discarded and the caller gets [`HubError::Timeout`].
#[derive(Debug, Clone)]
pub struct BoundedTimeout {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl Default for BoundedTimeout {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT)
    }
}

impl BoundedTimeout {
    /// Create a pool with `max_workers` slots and a per-task deadline
    pub fn new(max_workers: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
            timeout,
        }
    }

    /// The per-task deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a task under the pool bound and deadline.
    ///
    /// Waits for a free worker slot, spawns the task, then waits up to the
    /// deadline for it to finish. On timeout the spawned task is left
    /// running and its eventual result is dropped.
    pub async fn run<T, Fut>(&self, task: Fut) -> Result<T, HubError>
    where
        T: Send + 'static,
        Fut: std::future::Future<Output = Result<T, HubError>> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| HubError::Other("worker pool is closed".to_string()))?;

        let handle = tokio::spawn(async move {
            let result = task.await;
            drop(permit);
            result
        });

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(HubError::Other(format!(
                "worker task failed: {}",
                join_error
            ))),
            // Dropping the JoinHandle detaches the task; it finishes in the
            // background and releases its permit then.
            Err(_elapsed) => Err(HubError::Timeout),
        }
    }
}
