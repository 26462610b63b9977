//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`PurgeSystem`] - Spawns the catalog actor, runs the engine, shuts down
//! - [`CancellationController`] - Maps operator interrupts onto the run's cancellation token
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod cancellation;
pub mod purge_system;
pub mod tracing;

pub use cancellation::*;
pub use purge_system::*;
pub use self::tracing::*;
