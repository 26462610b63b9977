use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Exit status used when a second interrupt forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Owns the run's cancellation token and maps operator interrupts onto it.
///
/// The first interrupt cancels the token and leaves the process running so the
/// engine can drain. A second interrupt exits immediately.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle on the token. Every clone observes the same cancellation.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the run. Safe to call repeatedly and from any task; returns
    /// `true` only for the call that actually flipped the token.
    pub fn cancel(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Spawns the interrupt listener.
    pub fn listen_for_interrupt(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Unable to listen for interrupt");
                return;
            }
            debug!("Interrupt received");
            controller.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                error!("Second interrupt received, exiting without draining");
                std::process::exit(FORCED_EXIT_CODE);
            }
        })
    }
}
