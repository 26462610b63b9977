//! Command-line interface.
//!
//! Parses flags (with environment fallbacks), validates them into a
//! [`DispatchConfig`] before anything touches the catalog, and maps the run's
//! result onto a process exit status.

use crate::framework::{ConfigError, DispatchConfig, Pattern, RunError, RunState, RunSummary};
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Every WorkItem succeeded (or dry-run finished).
pub const EXIT_OK: u8 = 0;
/// Configuration error or fatal listing failure.
pub const EXIT_FATAL: u8 = 1;
/// The run finished but at least one deletion failed.
pub const EXIT_PARTIAL: u8 = 2;
/// The run was cancelled by an interrupt.
pub const EXIT_CANCELLED: u8 = 130;

/// Bulk-delete catalog projects whose names match a pattern
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog file listing the projects
    #[arg(short, long, value_name = "FILE", env = "PURGE_CATALOG")]
    pub catalog: PathBuf,

    /// Regular expression selecting the projects to delete (unanchored)
    #[arg(short, long, value_name = "REGEX")]
    pub pattern: String,

    /// Match the pattern case-insensitively
    #[arg(short, long)]
    pub ignore_case: bool,

    /// Report matches without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Maximum concurrent deletions [default: number of logical CPUs]
    #[arg(short = 'w', long, value_name = "N", env = "PURGE_MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Projects requested per listing page
    #[arg(long, value_name = "N", default_value = "100")]
    pub page_size: NonZeroUsize,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Compiles the pattern and validates the worker count.
    pub fn dispatch_config(&self) -> Result<DispatchConfig, ConfigError> {
        let pattern = if self.ignore_case {
            Pattern::case_insensitive(&self.pattern)?
        } else {
            Pattern::new(&self.pattern)?
        };
        DispatchConfig::new(pattern, self.dry_run, self.max_workers)
    }
}

/// Exit status for a finished run.
///
/// Individual deletion failures do not fail the run, but they do make the exit
/// status non-zero so scripts can tell a partial purge from a clean one.
pub fn exit_code(result: &Result<RunSummary, RunError>) -> u8 {
    match result {
        Err(_) => EXIT_FATAL,
        Ok(summary) if summary.state == RunState::Cancelled => EXIT_CANCELLED,
        Ok(summary) if summary.has_failures() => EXIT_PARTIAL,
        Ok(_) => EXIT_OK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_actor::DEFAULT_PAGE_SIZE;
    use crate::framework::SourceError;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["project-purge"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--catalog", "projects.json", "--pattern", "TestProject"]);
        assert!(!cli.dry_run);
        assert_eq!(cli.page_size.get(), DEFAULT_PAGE_SIZE);

        let config = cli.dispatch_config().unwrap();
        assert!(config.pattern.matches("TestProject7"));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["-c", "p.json", "-p", "^tmp", "-i", "-n", "-w", "3", "--page-size", "10"]);
        let config = cli.dispatch_config().unwrap();
        assert!(config.dry_run);
        assert_eq!(config.max_workers.get(), 3);
        assert!(config.pattern.matches("TMP-1"));
        assert_eq!(cli.page_size.get(), 10);
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let cli = parse(&["-c", "p.json", "-p", "(", "-w", "2"]);
        assert!(matches!(cli.dispatch_config(), Err(ConfigError::InvalidPattern { .. })));

        let cli = parse(&["-c", "p.json", "-p", "x", "-w", "0"]);
        assert!(matches!(cli.dispatch_config(), Err(ConfigError::ZeroWorkers)));

        let cli = parse(&["-c", "p.json", "-p", "x", "-w", "18446744073709551615"]);
        assert!(matches!(cli.dispatch_config(), Err(ConfigError::TooManyWorkers { .. })));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let argv = ["project-purge", "-c", "p.json", "-p", "x", "--page-size", "0"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let completed = RunSummary {
            state: RunState::Completed,
            ..Default::default()
        };
        assert_eq!(exit_code(&Ok(completed.clone())), EXIT_OK);

        let partial = RunSummary {
            failed: 1,
            ..completed.clone()
        };
        assert_eq!(exit_code(&Ok(partial)), EXIT_PARTIAL);

        let cancelled = RunSummary {
            state: RunState::Cancelled,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(exit_code(&Ok(cancelled)), EXIT_CANCELLED);

        let failed = Err(RunError::Source {
            error: SourceError::Unavailable,
            summary: RunSummary::default(),
        });
        assert_eq!(exit_code(&failed), EXIT_FATAL);
    }
}
