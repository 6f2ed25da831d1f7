//! Bounded worker pool for one download phase.
//!
//! The pool uses a semaphore-based concurrency control pattern: a permit is
//! acquired before each task is spawned, so at most `size` fetches are in
//! flight. [`WorkerPool::run`] returns only after every task has finished,
//! which is the barrier between phases.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::report::DownloadReport;
use super::task::DownloadTask;
use super::{DownloadError, HttpClient};

/// Minimum allowed pool size.
const MIN_POOL_SIZE: usize = 1;

/// Largest pool the semaphore can represent.
const MAX_POOL_SIZE: usize = Semaphore::MAX_PERMITS;

/// Default number of concurrent thumbnail downloads.
pub const DEFAULT_THREAD_COUNT: usize = 10;

/// Error type for worker pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid pool size provided.
    #[error("invalid pool size {value}: must be at least {MIN_POOL_SIZE}")]
    InvalidSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A download failed; the remaining downloads were aborted.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A download task panicked or was cancelled.
    #[error("download task did not complete: {0}")]
    TaskFailed(#[source] JoinError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Outcome of a completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// Number of downloads recorded by the phase.
    pub completed: usize,
    /// Wall-clock time from first dispatch to the last completion.
    pub elapsed: Duration,
}

/// Fixed-size pool that runs a batch of [`DownloadTask`]s.
#[derive(Debug)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool allowing `size` concurrent downloads.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidSize`] if `size` is zero or larger than
    /// [`Semaphore::MAX_PERMITS`].
    ///
    /// # Example
    ///
    /// ```
    /// use iiif_timer::download::WorkerPool;
    ///
    /// let pool = WorkerPool::new(4).unwrap();
    /// assert_eq!(pool.size(), 4);
    /// assert!(WorkerPool::new(0).is_err());
    /// ```
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if !(MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&size) {
            return Err(PoolError::InvalidSize { value: size });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs every task and waits for all of them to finish.
    ///
    /// Each task appends its elapsed time to `report`. The first failure
    /// aborts the tasks still running and is returned; no partial outcome
    /// is reported.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Download`] for a failed fetch,
    /// [`PoolError::TaskFailed`] if a task panicked, or
    /// [`PoolError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip(self, tasks, client, report), fields(pool_size = self.size, tasks = tasks.len()))]
    pub async fn run(
        &self,
        tasks: Vec<DownloadTask>,
        client: &HttpClient,
        report: &Arc<DownloadReport>,
    ) -> Result<PhaseOutcome, PoolError> {
        let started = Instant::now();
        let mut running = JoinSet::new();
        let mut completed = 0usize;

        for task in tasks {
            // Blocks while `size` downloads are in flight
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PoolError::SemaphoreClosed)?;

            let client = client.clone();
            let report = Arc::clone(report);

            running.spawn(async move {
                let _permit = permit;
                task.run(&client, &report).await
            });

            while let Some(joined) = running.try_join_next() {
                settle(joined, &mut running)?;
                completed += 1;
            }
        }

        debug!(in_flight = running.len(), "waiting for downloads to complete");

        while let Some(joined) = running.join_next().await {
            settle(joined, &mut running)?;
            completed += 1;
        }

        let elapsed = started.elapsed();
        info!(completed, elapsed_ms = elapsed.as_millis(), "phase complete");

        Ok(PhaseOutcome { completed, elapsed })
    }
}

fn settle(
    joined: Result<Result<u64, DownloadError>, JoinError>,
    running: &mut JoinSet<Result<u64, DownloadError>>,
) -> Result<(), PoolError> {
    let failure = match joined {
        Ok(Ok(_)) => return Ok(()),
        Ok(Err(error)) => PoolError::Download(error),
        Err(join_error) => PoolError::TaskFailed(join_error),
    };

    warn!(error = %failure, aborted = running.len(), "download failed; aborting phase");
    running.abort_all();
    Err(failure)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_new_valid_size() {
        assert_eq!(WorkerPool::new(1).map(|p| p.size()).ok(), Some(1));
        assert_eq!(WorkerPool::new(10).map(|p| p.size()).ok(), Some(10));
        assert_eq!(WorkerPool::new(100).map(|p| p.size()).ok(), Some(100));
        assert_eq!(WorkerPool::new(250).map(|p| p.size()).ok(), Some(250));
    }

    #[test]
    fn test_pool_new_invalid_size_zero() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(PoolError::InvalidSize { value: 0 })
        ));
    }

    #[test]
    fn test_pool_new_invalid_size_too_high() {
        assert!(matches!(
            WorkerPool::new(usize::MAX),
            Err(PoolError::InvalidSize { value: usize::MAX })
        ));
    }

    #[test]
    fn test_pool_error_display() {
        let msg = PoolError::InvalidSize { value: 0 }.to_string();
        assert!(msg.contains("invalid pool size"));
        assert!(msg.contains("at least 1"));
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let pool = WorkerPool::new(2).unwrap();
        let client = HttpClient::new().unwrap();
        let report = Arc::new(DownloadReport::new());

        let outcome = pool
            .run(Vec::new(), &client, &report)
            .await
            .unwrap();
        assert_eq!(outcome.completed, 0);
        assert!(report.thumbnail_times().is_empty());
    }
}
