use anyhow::Context;
use clap::Parser;
use project_purge::catalog_actor::CatalogStore;
use project_purge::cli::{exit_code, Cli, EXIT_FATAL};
use project_purge::framework::{LogReporter, RunError};
use project_purge::lifecycle::{setup_tracing, CancellationController, PurgeSystem};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    // Validate before the catalog is even opened.
    let config = cli.dispatch_config().context("Invalid configuration")?;
    let store = CatalogStore::load(&cli.catalog)
        .await
        .context("Failed to open catalog")?;

    info!(catalog = %cli.catalog.display(), projects = store.len(), "Catalog opened");

    let system = PurgeSystem::new(store, cli.page_size.get());
    let controller = CancellationController::new();
    let listener = controller.listen_for_interrupt();

    let result = system
        .run(config, &controller.token(), Arc::new(LogReporter::new()))
        .await;
    listener.abort();

    if let Err(RunError::Source { error, summary }) = &result {
        error!(
            error = %error,
            deleted = summary.deleted,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Listing failed; remaining projects were not processed"
        );
    }

    system.shutdown().await.context("Catalog shutdown failed")?;
    Ok(exit_code(&result))
}
