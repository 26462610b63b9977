//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for the binary.
//!
//! ## Configuration
//!
//! The subscriber uses a compact format without module targets, so every line
//! is a level, a message and its structured fields:
//!
//! ```text
//! INFO Run started pattern="TestProject" dry_run=false max_workers=4
//! INFO Deleting name=TestProject1
//! WARN Delete failed name=TestProject2 error=Project not found: TestProject2
//! INFO Run finished state=completed scanned=3 matched=2 submitted=2 deleted=1 failed=1 cancelled=0
//! ```
//!
//! `RUST_LOG` always wins. Without it the level is `info`, or `debug` when
//! `--verbose` is passed.
//!
//! ```bash
//! # Show skipped (non-matching) projects too
//! RUST_LOG=trace project-purge --catalog projects.json --pattern '^tmp-' --dry-run
//!
//! # Only engine internals at debug
//! RUST_LOG=project_purge::framework=debug project-purge ...
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
