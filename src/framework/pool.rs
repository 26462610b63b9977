//! # Bounded Worker Pool
//!
//! A fixed-size pool that executes deletions against a [`DeletionSink`].
//!
//! Capacity is a [`Semaphore`] with `max_workers` permits. A WorkItem is only
//! spawned once it owns a permit, and holds it until it reaches a terminal
//! state, so no more than `max_workers` deletes ever run at once. The permit
//! counter is the only state shared between the submitting loop and the
//! workers.
//!
//! Shutdown is explicit: [`WorkerPool::drain`] consumes the pool (nothing more
//! can be submitted) and waits for every spawned WorkItem.

use crate::framework::report::{RunEvent, RunReporter};
use crate::framework::{DeletionError, DeletionSink, WorkOutcome, WorkStatus};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Cancellation fired before a worker slot became free.
    #[error("Pool cancelled")]
    Cancelled,
}

/// Terminal-state counts for everything the pool accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub submitted: usize,
    pub deleted: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl PoolStats {
    pub fn terminal(&self) -> usize {
        self.deleted + self.failed + self.cancelled
    }
}

pub struct WorkerPool<K: DeletionSink> {
    sink: Arc<K>,
    permits: Arc<Semaphore>,
    max_workers: usize,
    tasks: JoinSet<WorkOutcome>,
    cancel: CancellationToken,
    reporter: Arc<dyn RunReporter>,
    stats: PoolStats,
}

impl<K: DeletionSink> WorkerPool<K> {
    pub fn new(
        sink: Arc<K>,
        max_workers: NonZeroUsize,
        cancel: CancellationToken,
        reporter: Arc<dyn RunReporter>,
    ) -> Self {
        let max_workers = max_workers.get();
        Self {
            sink,
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            tasks: JoinSet::new(),
            cancel,
            reporter,
            stats: PoolStats::default(),
        }
    }

    /// WorkItems currently holding a worker slot.
    pub fn in_flight(&self) -> usize {
        self.max_workers - self.permits.available_permits()
    }

    /// Submits a deletion of `name`.
    ///
    /// Waits for a free worker slot when the pool is saturated. The wait is
    /// interrupted by cancellation, in which case nothing is spawned and
    /// [`SubmitError::Cancelled`] is returned.
    pub async fn submit(&mut self, name: String) -> Result<(), SubmitError> {
        self.reap_finished();

        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SubmitError::Cancelled),
            // The semaphore is never closed.
            permit = self.permits.clone().acquire_owned() => {
                permit.map_err(|_| SubmitError::Cancelled)?
            }
        };

        self.reporter.report(RunEvent::Deleting { name: name.clone() });
        self.stats.submitted += 1;

        let sink = self.sink.clone();
        let cancel = self.cancel.clone();
        let reporter = self.reporter.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            execute(sink.as_ref(), name, &cancel, reporter.as_ref()).await
        });
        Ok(())
    }

    /// Closes the pool and waits for every submitted WorkItem to finish.
    pub async fn drain(mut self) -> PoolStats {
        debug!(
            pending = self.tasks.len(),
            in_flight = self.in_flight(),
            "Draining worker pool"
        );
        while let Some(result) = self.tasks.join_next().await {
            self.record(result);
        }
        debug!(stats = ?self.stats, "Worker pool drained");
        self.stats
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            self.record(result);
        }
    }

    fn record(&mut self, result: Result<WorkOutcome, JoinError>) {
        match result {
            Ok(outcome) => match outcome.status {
                WorkStatus::Deleted => self.stats.deleted += 1,
                WorkStatus::Failed(_) => self.stats.failed += 1,
                WorkStatus::Cancelled => self.stats.cancelled += 1,
            },
            Err(e) if e.is_cancelled() => self.stats.cancelled += 1,
            Err(e) => {
                error!(error = %e, "WorkItem panicked");
                self.stats.failed += 1;
            }
        }
    }
}

/// Runs one WorkItem to a terminal state.
async fn execute<K: DeletionSink>(
    sink: &K,
    name: String,
    cancel: &CancellationToken,
    reporter: &dyn RunReporter,
) -> WorkOutcome {
    // The sink owns cancellation from here on, so a delete it already
    // committed is reported as deleted rather than cancelled.
    let result = if cancel.is_cancelled() {
        Err(DeletionError::Cancelled)
    } else {
        sink.delete(&name, cancel).await
    };

    let status = match result {
        Ok(()) => {
            reporter.report(RunEvent::Deleted { name: name.clone() });
            WorkStatus::Deleted
        }
        Err(DeletionError::Cancelled) => {
            reporter.report(RunEvent::DeleteCancelled { name: name.clone() });
            WorkStatus::Cancelled
        }
        Err(error) => {
            reporter.report(RunEvent::DeleteFailed {
                name: name.clone(),
                error: error.clone(),
            });
            WorkStatus::Failed(error)
        }
    };

    WorkOutcome { name, status }
}
