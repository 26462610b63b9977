//! Run reporting.
//!
//! The engine and pool never print anything themselves. They emit [`RunEvent`]s
//! to a [`RunReporter`], which lets the same run logic drive console logging in
//! the binary and event capture in tests.

use crate::framework::{DeletionError, RunSummary};
use tracing::{debug, info, warn};

/// Something observable happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Dry-run match.
    WouldDelete { name: String },
    /// A WorkItem was submitted to the pool.
    Deleting { name: String },
    Deleted { name: String },
    DeleteFailed { name: String, error: DeletionError },
    DeleteCancelled { name: String },
    /// The engine observed cancellation and stopped submitting.
    Canceling,
    Finished { summary: RunSummary },
}

impl RunEvent {
    pub fn name(&self) -> Option<&str> {
        match self {
            RunEvent::WouldDelete { name }
            | RunEvent::Deleting { name }
            | RunEvent::Deleted { name }
            | RunEvent::DeleteFailed { name, .. }
            | RunEvent::DeleteCancelled { name } => Some(name),
            RunEvent::Canceling | RunEvent::Finished { .. } => None,
        }
    }
}

/// Sink for run events. Called from the pull loop and from worker tasks.
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent);
}

/// Reporter that writes every event through `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    pub fn new() -> Self {
        Self
    }
}

impl RunReporter for LogReporter {
    fn report(&self, event: RunEvent) {
        match event {
            RunEvent::WouldDelete { name } => info!(name = %name, "Would delete"),
            RunEvent::Deleting { name } => info!(name = %name, "Deleting"),
            RunEvent::Deleted { name } => debug!(name = %name, "Deleted"),
            RunEvent::DeleteFailed { name, error } => {
                warn!(name = %name, error = %error, "Delete failed")
            }
            RunEvent::DeleteCancelled { name } => debug!(name = %name, "Delete cancelled"),
            RunEvent::Canceling => warn!("Canceling: no new deletions will be submitted"),
            RunEvent::Finished { summary } => info!(
                state = %summary.state,
                dry_run = summary.dry_run,
                scanned = summary.scanned,
                matched = summary.matched,
                submitted = summary.submitted,
                deleted = summary.deleted,
                failed = summary.failed,
                cancelled = summary.cancelled,
                "Run finished"
            ),
        }
    }
}
