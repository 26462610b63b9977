//! # Catalog Actor
//!
//! The "server" half of the catalog. It owns the [`CatalogStore`] and the
//! receiving end of the request channel, and processes requests one at a time.
//! Concurrent deletions from the worker pool are therefore serialized here
//! without any locking around the store or the catalog file.

use crate::catalog_actor::{CatalogError, CatalogStore};
use crate::framework::Page;
use crate::model::{Project, ProjectDescriptor};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, CatalogError>>;

/// Requests the catalog actor understands.
#[derive(Debug)]
pub enum CatalogRequest {
    ListPage {
        after: Option<String>,
        limit: usize,
        respond_to: Response<Page<ProjectDescriptor>>,
    },
    /// Skipped with [`CatalogError::Cancelled`] if `cancel` has fired by the
    /// time the actor gets to it.
    Delete {
        name: String,
        cancel: CancellationToken,
        respond_to: Response<Project>,
    },
}

pub struct CatalogActor {
    receiver: mpsc::Receiver<CatalogRequest>,
    store: CatalogStore,
}

impl CatalogActor {
    /// Creates the actor and the sender clients use to reach it.
    ///
    /// `buffer_size` bounds the request channel; senders wait when it is full.
    pub fn new(buffer_size: usize, store: CatalogStore) -> (Self, mpsc::Sender<CatalogRequest>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver, store }, sender)
    }

    /// Processes requests until every sender is dropped, then hands back the store.
    pub async fn run(mut self) -> CatalogStore {
        info!(projects = self.store.len(), "Catalog actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CatalogRequest::ListPage {
                    after,
                    limit,
                    respond_to,
                } => {
                    let page = self.store.page_after(after.as_deref(), limit);
                    debug!(after = ?after, items = page.items.len(), more = page.continuation.is_some(), "ListPage");
                    let _ = respond_to.send(Ok(page));
                }
                CatalogRequest::Delete {
                    name,
                    cancel,
                    respond_to,
                } => {
                    if cancel.is_cancelled() {
                        debug!(name = %name, "Delete skipped, request cancelled");
                        let _ = respond_to.send(Err(CatalogError::Cancelled));
                        continue;
                    }
                    let result = self.store.remove(&name).await;
                    match &result {
                        Ok(_) => debug!(name = %name, remaining = self.store.len(), "Removed from catalog"),
                        Err(e) => warn!(name = %name, error = %e, "Delete failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(projects = self.store.len(), "Catalog actor shutdown");
        self.store
    }
}
