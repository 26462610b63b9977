//! # Core Dispatch Framework
//!
//! This module defines the generic building blocks the dispatch engine is written against.
//!
//! ## Key Types
//!
//! - [`Descriptor`]: The trait every listed resource must implement.
//! - [`ResourceSource`]: A paginated listing endpoint.
//! - [`DeletionSink`]: A remote delete-by-name operation.
//! - [`SourceError`], [`DeletionError`], [`ConfigError`], [`RunError`]: The error taxonomy.
//! - [`RunState`]: The run's state machine.

use async_trait::async_trait;
use std::fmt::{self, Debug, Display};
use tokio_util::sync::CancellationToken;

// =============================================================================
// 1. THE ABSTRACTION (Descriptors, Sources and Sinks)
// =============================================================================

/// A lightweight record identifying one remote resource.
///
/// The engine only ever looks at the name: it is what the pattern is matched
/// against and what the [`DeletionSink`] receives.
pub trait Descriptor: Send + Sync + Debug + 'static {
    fn name(&self) -> &str;
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<D> {
    pub items: Vec<D>,
    /// Token for the next page, `None` when this is the last one.
    pub continuation: Option<String>,
}

impl<D> Page<D> {
    pub fn last(items: Vec<D>) -> Self {
        Self {
            items,
            continuation: None,
        }
    }

    pub fn with_continuation(items: Vec<D>, continuation: impl Into<String>) -> Self {
        Self {
            items,
            continuation: Some(continuation.into()),
        }
    }
}

/// A remote listing endpoint that hands out descriptors one page at a time.
///
/// Use [`crate::framework::paginate`] to turn a source into a lazy stream.
///
/// # Cancellation
/// Implementations receive the run's cancellation token and should abandon
/// in-progress network calls with [`SourceError::Cancelled`] once it fires.
#[async_trait]
pub trait ResourceSource: Send + Sync + 'static {
    type Descriptor: Descriptor;

    async fn list_page(
        &self,
        continuation: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Page<Self::Descriptor>, SourceError>;
}

/// The remote delete operation.
///
/// The same token the engine observes is passed to every call so an in-flight
/// request can be unwound instead of running to completion. Implementations
/// must return promptly once it fires: the pool waits for their answer, and
/// only reports a WorkItem cancelled when the sink says so.
#[async_trait]
pub trait DeletionSink: Send + Sync + 'static {
    async fn delete(&self, name: &str, cancel: &CancellationToken) -> Result<(), DeletionError>;
}

// =============================================================================
// 2. ERRORS
// =============================================================================

/// Invalid run configuration. Always raised before any listing starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Worker count must be at least 1")]
    ZeroWorkers,
    #[error("Worker count {requested} exceeds the maximum of {max}")]
    TooManyWorkers { requested: usize, max: usize },
}

/// Failure while pulling from a [`ResourceSource`]. Fatal to the run.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SourceError {
    #[error("Listing failed: {0}")]
    Transport(String),
    #[error("Listing service unavailable")]
    Unavailable,
    #[error("Continuation token {0:?} did not advance")]
    StalledContinuation(String),
    #[error("Listing cancelled")]
    Cancelled,
}

/// Failure of a single delete. Isolated to its WorkItem.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DeletionError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Delete rejected: {0}")]
    Rejected(String),
    #[error("Deletion service unavailable")]
    Unavailable,
    #[error("Delete cancelled")]
    Cancelled,
}

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The listing failed mid-stream. Work submitted before the failure has
    /// already been drained; `summary` accounts for it.
    #[error("{error}")]
    Source {
        error: SourceError,
        summary: RunSummary,
    },
}

// =============================================================================
// 3. RUN STATE & OUTCOMES
// =============================================================================

/// Overall run state.
///
/// `NotStarted -> Running -> {Completed | Cancelled | Failed}`. Terminal
/// states never go back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled | RunState::Failed)
    }

    /// Moves to `next` unless already terminal. Returns whether the state changed.
    pub fn advance(&mut self, next: RunState) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        *self = next;
        true
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::NotStarted => "not-started",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal state of one WorkItem.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkStatus {
    Deleted,
    Failed(DeletionError),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkOutcome {
    pub name: String,
    pub status: WorkStatus,
}

/// Accounting for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub state: RunState,
    pub dry_run: bool,
    /// Descriptors pulled from the source.
    pub scanned: usize,
    /// Descriptors whose name matched the pattern.
    pub matched: usize,
    /// WorkItems handed to the pool.
    pub submitted: usize,
    pub deleted: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunSummary {
    /// Matches reported in dry-run mode, WorkItems submitted otherwise.
    pub fn attempted(&self) -> usize {
        if self.dry_run {
            self.matched
        } else {
            self.submitted
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Every submitted WorkItem reached a terminal state.
    pub fn is_fully_accounted(&self) -> bool {
        self.deleted + self.failed + self.cancelled == self.submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_is_one_way() {
        let mut state = RunState::default();
        assert!(state.advance(RunState::Running));
        assert!(state.advance(RunState::Cancelled));
        assert!(!state.advance(RunState::Running));
        assert!(!state.advance(RunState::Completed));
        assert_eq!(state, RunState::Cancelled);
    }

    #[test]
    fn test_attempted_depends_on_mode() {
        let dry = RunSummary {
            dry_run: true,
            matched: 4,
            ..Default::default()
        };
        assert_eq!(dry.attempted(), 4);

        let live = RunSummary {
            matched: 4,
            submitted: 3,
            deleted: 2,
            cancelled: 1,
            ..Default::default()
        };
        assert_eq!(live.attempted(), 3);
        assert!(live.is_fully_accounted());
        assert!(!live.has_failures());
    }
}
