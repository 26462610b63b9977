//! # Dispatch Engine
//!
//! The engine owns the pull loop. It consumes a descriptor stream one item at
//! a time, applies the [`Pattern`], and either reports a dry-run match or
//! submits a deletion to a [`WorkerPool`].
//!
//! ## Run sequence
//!
//! 1. Pull the next descriptor, racing the cancellation token.
//! 2. Drop non-matches (trace level only).
//! 3. Dry-run: report `WouldDelete`. The pool is never created.
//! 4. Live: submit to the pool. Submission waits for a free slot but gives up
//!    as soon as cancellation fires.
//! 5. On exhaustion, cancellation or a source error, stop pulling and drain the
//!    pool before reporting. A source error is only surfaced after the drain.
//!
//! Submission order follows source order. Completion order is unspecified.

use crate::framework::matcher::Pattern;
use crate::framework::paginate;
use crate::framework::pool::WorkerPool;
use crate::framework::report::{RunEvent, RunReporter};
use crate::framework::{
    ConfigError, DeletionSink, Descriptor, ResourceSource, RunError, RunState, RunSummary,
    SourceError,
};
use futures::{Stream, StreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace};

/// Settings for one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub pattern: Pattern,
    pub dry_run: bool,
    pub max_workers: NonZeroUsize,
}

impl DispatchConfig {
    /// Builds a config from raw settings.
    ///
    /// `max_workers = None` uses the number of logical CPUs. The count is
    /// capped by the semaphore backing the worker pool.
    pub fn new(pattern: Pattern, dry_run: bool, max_workers: Option<usize>) -> Result<Self, ConfigError> {
        let workers = max_workers.unwrap_or_else(num_cpus::get);
        if workers > Semaphore::MAX_PERMITS {
            return Err(ConfigError::TooManyWorkers {
                requested: workers,
                max: Semaphore::MAX_PERMITS,
            });
        }
        let max_workers = NonZeroUsize::new(workers).ok_or(ConfigError::ZeroWorkers)?;
        Ok(Self {
            pattern,
            dry_run,
            max_workers,
        })
    }
}

pub struct DispatchEngine<K: DeletionSink> {
    config: DispatchConfig,
    sink: Arc<K>,
    reporter: Arc<dyn RunReporter>,
}

/// Why the pull loop stopped.
enum Stop {
    Exhausted,
    Cancelled,
    Failed(SourceError),
}

impl<K: DeletionSink> DispatchEngine<K> {
    pub fn new(config: DispatchConfig, sink: Arc<K>, reporter: Arc<dyn RunReporter>) -> Self {
        Self {
            config,
            sink,
            reporter,
        }
    }

    /// Paginates `source` and runs over the resulting stream.
    pub async fn run_source<S>(
        &self,
        source: Arc<S>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RunError>
    where
        S: ResourceSource,
    {
        self.run(paginate(source, cancel.clone()), cancel).await
    }

    /// Processes `source` to exhaustion, cancellation or failure.
    ///
    /// In live mode every WorkItem submitted before the loop stopped has
    /// reached a terminal state when this returns, including on `Err`.
    pub async fn run<St, D>(&self, source: St, cancel: &CancellationToken) -> Result<RunSummary, RunError>
    where
        St: Stream<Item = Result<D, SourceError>> + Send,
        D: Descriptor,
    {
        let mut summary = RunSummary {
            dry_run: self.config.dry_run,
            ..Default::default()
        };
        self.transition(&mut summary, RunState::Running);
        info!(
            pattern = self.config.pattern.as_str(),
            dry_run = self.config.dry_run,
            max_workers = self.config.max_workers.get(),
            "Run started"
        );

        let mut pool = (!self.config.dry_run).then(|| {
            WorkerPool::new(
                self.sink.clone(),
                self.config.max_workers,
                cancel.clone(),
                self.reporter.clone(),
            )
        });

        futures::pin_mut!(source);
        let stop = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Stop::Cancelled,
                next = source.next() => next,
            };

            let descriptor = match next {
                None => break Stop::Exhausted,
                Some(Ok(descriptor)) => descriptor,
                Some(Err(SourceError::Cancelled)) => break Stop::Cancelled,
                Some(Err(e)) => break Stop::Failed(e),
            };
            summary.scanned += 1;

            let name = descriptor.name();
            if !self.config.pattern.matches(name) {
                trace!(name = %name, "Skipping non-match");
                continue;
            }
            summary.matched += 1;

            match pool.as_mut() {
                None => self.reporter.report(RunEvent::WouldDelete {
                    name: name.to_string(),
                }),
                Some(pool) => {
                    if pool.submit(name.to_string()).await.is_err() {
                        break Stop::Cancelled;
                    }
                }
            }
        };

        if matches!(stop, Stop::Cancelled) || cancel.is_cancelled() {
            self.reporter.report(RunEvent::Canceling);
        }

        if let Some(pool) = pool {
            let stats = pool.drain().await;
            summary.submitted = stats.submitted;
            summary.deleted = stats.deleted;
            summary.failed = stats.failed;
            summary.cancelled = stats.cancelled;
        }

        let result = match stop {
            Stop::Failed(error) => {
                self.transition(&mut summary, RunState::Failed);
                error!(error = %error, "Listing failed; run aborted after draining submitted deletions");
                Err(error)
            }
            Stop::Cancelled => {
                self.transition(&mut summary, RunState::Cancelled);
                Ok(())
            }
            Stop::Exhausted if cancel.is_cancelled() => {
                self.transition(&mut summary, RunState::Cancelled);
                Ok(())
            }
            Stop::Exhausted => {
                self.transition(&mut summary, RunState::Completed);
                Ok(())
            }
        };

        self.reporter.report(RunEvent::Finished {
            summary: summary.clone(),
        });

        match result {
            Ok(()) => Ok(summary),
            Err(error) => Err(RunError::Source { error, summary }),
        }
    }

    fn transition(&self, summary: &mut RunSummary, next: RunState) {
        let from = summary.state;
        if summary.state.advance(next) {
            info!(from = %from, to = %next, "Run state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{MockSink, RecordingReporter};
    use crate::model::ProjectDescriptor;
    use futures::stream;

    fn items(names: &[&str]) -> Vec<Result<ProjectDescriptor, SourceError>> {
        names.iter().map(|n| Ok(ProjectDescriptor::new(*n))).collect()
    }

    fn engine(dry_run: bool, workers: usize, sink: Arc<MockSink>, reporter: Arc<RecordingReporter>) -> DispatchEngine<MockSink> {
        let config = DispatchConfig::new(Pattern::new("TestProject").unwrap(), dry_run, Some(workers)).unwrap();
        DispatchEngine::new(config, sink, reporter)
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = DispatchConfig::new(Pattern::new("x").unwrap(), false, Some(0)).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroWorkers));
    }

    #[test]
    fn test_worker_count_above_semaphore_limit_rejected() {
        let err = DispatchConfig::new(Pattern::new("x").unwrap(), false, Some(usize::MAX)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooManyWorkers { requested, max }
                if requested == usize::MAX && max == Semaphore::MAX_PERMITS
        ));

        let config = DispatchConfig::new(Pattern::new("x").unwrap(), false, Some(Semaphore::MAX_PERMITS)).unwrap();
        assert_eq!(config.max_workers.get(), Semaphore::MAX_PERMITS);
    }

    #[test]
    fn test_default_workers_is_cpu_count() {
        let config = DispatchConfig::new(Pattern::new("x").unwrap(), false, None).unwrap();
        assert_eq!(config.max_workers.get(), num_cpus::get());
    }

    #[tokio::test]
    async fn test_dry_run_never_touches_sink() {
        let sink = Arc::new(MockSink::new());
        let reporter = Arc::new(RecordingReporter::new());
        let engine = engine(true, 2, sink.clone(), reporter.clone());

        let summary = engine
            .run(stream::iter(items(&["TestProject1", "Keep", "TestProject2"])), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sink.calls(), 0);
        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.attempted(), 2);
        assert_eq!(reporter.would_delete(), vec!["TestProject1", "TestProject2"]);
    }

    #[tokio::test]
    async fn test_live_run_accounts_for_every_submission() {
        let sink = Arc::new(MockSink::new().fail_on("TestProject2"));
        let reporter = Arc::new(RecordingReporter::new());
        let engine = engine(false, 2, sink.clone(), reporter.clone());

        let summary = engine
            .run(stream::iter(items(&["TestProject1", "Keep", "TestProject2", "TestProject3"])), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.submitted, 3);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_fully_accounted());
        assert!(summary.has_failures());
        assert_eq!(reporter.deleting(), vec!["TestProject1", "TestProject2", "TestProject3"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_pulls_nothing() {
        let sink = Arc::new(MockSink::new());
        let reporter = Arc::new(RecordingReporter::new());
        let engine = engine(false, 2, sink.clone(), reporter.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = engine.run(stream::iter(items(&["TestProject1"])), &cancel).await.unwrap();

        assert_eq!(summary.state, RunState::Cancelled);
        assert_eq!(summary.scanned, 0);
        assert_eq!(sink.calls(), 0);
        assert!(reporter.events().contains(&RunEvent::Canceling));
    }
}
