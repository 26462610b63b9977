//! # Mock Framework & Testing Guide
//!
//! In-memory stand-ins for the engine's collaborators. They let tests script a
//! listing, inject failures and observe concurrency without a catalog actor.
//!
//! | Double | Stands in for | Observes |
//! |--------|---------------|----------|
//! | [`MockSource`] | [`ResourceSource`] | number of page requests |
//! | [`MockSink`] | [`DeletionSink`] | calls, deletions, live and peak concurrency |
//! | [`RecordingReporter`] | [`RunReporter`] | every [`RunEvent`] in order |
//!
//! ## Example
//!
//! ```rust
//! use project_purge::framework::mock::{MockSink, MockSource, RecordingReporter};
//! use project_purge::framework::{DispatchConfig, DispatchEngine, Pattern};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Arc::new(MockSource::new().page(["TestProject1", "Keep"]).page(["TestProject2"]));
//!     let sink = Arc::new(MockSink::new().fail_on("TestProject2"));
//!     let reporter = Arc::new(RecordingReporter::new());
//!
//!     let config = DispatchConfig::new(Pattern::new("TestProject").unwrap(), false, Some(2)).unwrap();
//!     let engine = DispatchEngine::new(config, sink.clone(), reporter.clone());
//!     let summary = engine.run_source(source, &CancellationToken::new()).await.unwrap();
//!
//!     assert_eq!(summary.deleted, 1);
//!     assert_eq!(summary.failed, 1);
//!     assert_eq!(sink.deleted(), vec!["TestProject1"]);
//! }
//! ```

use crate::framework::report::{RunEvent, RunReporter};
use crate::framework::{DeletionError, DeletionSink, Page, ResourceSource, SourceError};
use crate::model::ProjectDescriptor;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// =============================================================================
// MOCK SOURCE
// =============================================================================

#[derive(Debug, Clone)]
enum Step {
    Page(Vec<String>),
    Fail(String),
}

/// A scripted paginated listing.
///
/// Each call to [`MockSource::page`] or [`MockSource::fail`] adds one step;
/// every `list_page` request consumes the step its continuation points at.
#[derive(Debug, Default)]
pub struct MockSource {
    steps: Vec<Step>,
    delay: Option<Duration>,
    pulls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page of project names.
    pub fn page<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.steps.push(Step::Page(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Appends a request that fails with [`SourceError::Transport`].
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.steps.push(Step::Fail(message.into()));
        self
    }

    /// Delays every page request.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `list_page` calls made so far.
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceSource for MockSource {
    type Descriptor = ProjectDescriptor;

    async fn list_page(
        &self,
        continuation: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Page<ProjectDescriptor>, SourceError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let index = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SourceError::Transport(format!("bad continuation {token:?}")))?,
            None => 0,
        };

        match self.steps.get(index) {
            None => Ok(Page::last(Vec::new())),
            Some(Step::Fail(message)) => Err(SourceError::Transport(message.clone())),
            Some(Step::Page(names)) => {
                let items = names.iter().map(ProjectDescriptor::new).collect();
                if index + 1 < self.steps.len() {
                    Ok(Page::with_continuation(items, (index + 1).to_string()))
                } else {
                    Ok(Page::last(items))
                }
            }
        }
    }
}

// =============================================================================
// MOCK SINK
// =============================================================================

/// A deletion sink that records what it was asked to do.
#[derive(Debug, Default)]
pub struct MockSink {
    delay: Option<Duration>,
    failures: HashSet<String>,
    block: bool,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    attempted: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

/// Decrements the in-flight counter even when the delete future is dropped.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delete takes `delay` (abandoned early on cancellation).
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Deleting `name` fails with [`DeletionError::Rejected`].
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.failures.insert(name.into());
        self
    }

    /// Every delete hangs until the token is cancelled.
    pub fn block_until_cancelled(mut self) -> Self {
        self.block = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of deletes observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Names passed to `delete`, in call order.
    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    /// Names successfully deleted, in completion order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    async fn perform(&self, name: &str, cancel: &CancellationToken) -> Result<(), DeletionError> {
        if self.block {
            cancel.cancelled().await;
            return Err(DeletionError::Cancelled);
        }
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(DeletionError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if self.failures.contains(name) {
            return Err(DeletionError::Rejected(name.to_string()));
        }
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

#[async_trait]
impl DeletionSink for MockSink {
    async fn delete(&self, name: &str, cancel: &CancellationToken) -> Result<(), DeletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.attempted.lock().unwrap().push(name.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(self.in_flight.clone());
        self.peak.fetch_max(now, Ordering::SeqCst);

        self.perform(name, cancel).await
    }
}

// =============================================================================
// RECORDING REPORTER
// =============================================================================

/// Captures every event. Optionally cancels a token after the n-th submission.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RunEvent>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels `token` as soon as the `submissions`-th `Deleting` event arrives.
    pub fn cancel_after(submissions: usize, token: CancellationToken) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel_after: Some((submissions, token)),
        }
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn would_delete(&self) -> Vec<String> {
        self.names(|e| matches!(e, RunEvent::WouldDelete { .. }))
    }

    pub fn deleting(&self) -> Vec<String> {
        self.names(|e| matches!(e, RunEvent::Deleting { .. }))
    }

    pub fn failed(&self) -> Vec<String> {
        self.names(|e| matches!(e, RunEvent::DeleteFailed { .. }))
    }

    fn names(&self, filter: impl Fn(&RunEvent) -> bool) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter(e))
            .filter_map(|e| e.name().map(str::to_string))
            .collect()
    }
}

impl RunReporter for RecordingReporter {
    fn report(&self, event: RunEvent) {
        let mut events = self.events.lock().unwrap();
        events.push(event);

        if let Some((limit, token)) = &self.cancel_after {
            let submitted = events
                .iter()
                .filter(|e| matches!(e, RunEvent::Deleting { .. }))
                .count();
            if submitted >= *limit {
                token.cancel();
            }
        }
    }
}
