//! # Project Purge
//!
//! > **Bulk-delete remote projects by name pattern, with bounded parallelism.**
//!
//! This crate enumerates projects from a paginated listing, filters them with a
//! regular expression and deletes the matches through a fixed-size worker pool.
//! It supports a dry-run mode and graceful cancellation: on interrupt it stops
//! submitting work and drains what is already in flight before exiting.
//!
//! ## Guarantees
//!
//! - **Bounded concurrency**: never more than `max_workers` deletes in flight.
//! - **Exhaustive accounting**: every submitted deletion reaches a terminal
//!   state (deleted, failed or cancelled) before a run reports, including when
//!   the listing fails mid-stream.
//! - **Dry-run purity**: the deletion sink is never called in dry-run mode.
//! - **Isolated failures**: one failed delete never affects its siblings.
//! - **Cancellation halts new work**: after cancellation nothing more is submitted.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic pull loop, worker pool, matcher, paginator and the traits the
//! engine is written against ([`ResourceSource`](framework::ResourceSource),
//! [`DeletionSink`](framework::DeletionSink)).
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Key items**: [`PurgeSystem`](lifecycle::PurgeSystem),
//!   [`CancellationController`](lifecycle::CancellationController),
//!   [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ### 3. The Interface ([`clients`])
//! [`CatalogClient`](clients::CatalogClient) hides the catalog actor's message
//! passing and plugs into the engine as both source and sink.
//!
//! ### 4. The Implementation ([`catalog_actor`], [`model`])
//! A JSON-backed project catalog owned by a single actor task.
//!
//! ### Running
//!
//! ```bash
//! # See what would go
//! project-purge --catalog projects.json --pattern '^TestProject' --dry-run
//!
//! # Delete with at most 4 concurrent requests
//! project-purge --catalog projects.json --pattern '^TestProject' --max-workers 4
//! ```

pub mod catalog_actor;
pub mod cli;
pub mod clients;
pub mod framework;
pub mod lifecycle;
pub mod model;
