use crate::catalog_actor::{self, CatalogError, CatalogStore};
use crate::clients::CatalogClient;
use crate::framework::{DispatchConfig, DispatchEngine, RunError, RunReporter, RunSummary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The runtime orchestrator for a purge.
///
/// `PurgeSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the catalog actor
/// - **Dependency Wiring**: Handing the catalog client to the engine as both
///   its source and its sink
///
/// # Example
///
/// ```ignore
/// let system = PurgeSystem::new(CatalogStore::load("projects.json").await?, 100);
/// let summary = system.run(config, &cancel, Arc::new(LogReporter::new())).await?;
/// let remaining = system.shutdown().await?;
/// ```
pub struct PurgeSystem {
    /// Client for interacting with the catalog actor
    pub catalog_client: CatalogClient,

    /// Task handle for the catalog actor (used for graceful shutdown)
    handle: tokio::task::JoinHandle<CatalogStore>,
}

impl PurgeSystem {
    /// Spawns the catalog actor over `store`.
    pub fn new(store: CatalogStore, page_size: usize) -> Self {
        let (actor, catalog_client) = catalog_actor::new(store, page_size);
        let handle = tokio::spawn(actor.run());
        Self {
            catalog_client,
            handle,
        }
    }

    /// Runs one purge against the catalog.
    pub async fn run(
        &self,
        config: DispatchConfig,
        cancel: &CancellationToken,
        reporter: Arc<dyn RunReporter>,
    ) -> Result<RunSummary, RunError> {
        let client = Arc::new(self.catalog_client.clone());
        let engine = DispatchEngine::new(config, client.clone(), reporter);
        engine.run_source(client, cancel).await
    }

    /// Closes the catalog channel and waits for the actor to exit.
    ///
    /// Returns the store as the actor left it.
    pub async fn shutdown(self) -> Result<CatalogStore, CatalogError> {
        info!("Shutting down catalog...");

        // Dropping the last client closes the channel; the actor's receive loop then ends.
        drop(self.catalog_client);

        match self.handle.await {
            Ok(store) => {
                info!(remaining = store.len(), "Catalog shutdown complete.");
                Ok(store)
            }
            Err(e) => {
                error!("Catalog task failed: {:?}", e);
                Err(CatalogError::ActorFailed(e.to_string()))
            }
        }
    }
}
