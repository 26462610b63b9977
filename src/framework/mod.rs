//! Generic dispatch framework for bulk deletion.
//!
//! This module provides the building blocks for enumerating remote resources,
//! filtering them by name and deleting the matches with bounded parallelism.
//!
//! # Main Components
//!
//! - [`ResourceSource`] / [`DeletionSink`] - The remote listing and delete operations
//! - [`paginate`] - Turns a paginated source into a lazy descriptor stream
//! - [`Pattern`] - Compiled name matcher
//! - [`WorkerPool`] - Semaphore-gated worker pool with an explicit drain
//! - [`DispatchEngine`] - The pull loop that ties everything together
//! - [`RunReporter`] - Where run events go
//!
//! # Testing
//!
//! See [`mock`] module for in-memory sources, sinks and reporters.

pub mod core;
pub mod engine;
pub mod matcher;
pub mod mock;
pub mod paginator;
pub mod pool;
pub mod report;

// Re-export core types for convenience
pub use self::core::*;
pub use engine::{DispatchConfig, DispatchEngine};
pub use matcher::{matches, Pattern};
pub use paginator::paginate;
pub use pool::{PoolStats, SubmitError, WorkerPool};
pub use report::{LogReporter, RunEvent, RunReporter};
