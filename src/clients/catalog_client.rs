use crate::catalog_actor::{CatalogError, CatalogRequest};
use crate::framework::{DeletionError, DeletionSink, Page, ResourceSource, SourceError};
use crate::model::{Project, ProjectDescriptor};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Client for interacting with the catalog actor.
///
/// Cheap to clone. Sending a request races the cancellation token, so a
/// cancelled run never waits on a full channel. Once a delete has been
/// queued the reply is always awaited: the actor either commits it or skips
/// it because the token fired, and the caller learns which.
#[derive(Clone)]
pub struct CatalogClient {
    sender: mpsc::Sender<CatalogRequest>,
    page_size: usize,
}

impl CatalogClient {
    pub fn new(sender: mpsc::Sender<CatalogRequest>, page_size: usize) -> Self {
        Self {
            sender,
            page_size: page_size.max(1),
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn list_projects(
        &self,
        after: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Page<ProjectDescriptor>, CatalogError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        let request = CatalogRequest::ListPage {
            after,
            limit: self.page_size,
            respond_to,
        };
        self.send(request, cancel).await?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            reply = response => reply.map_err(|_| CatalogError::ActorDropped)?,
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn delete_project(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Project, CatalogError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        let request = CatalogRequest::Delete {
            name: name.to_string(),
            cancel: cancel.clone(),
            respond_to,
        };
        self.send(request, cancel).await?;

        response.await.map_err(|_| CatalogError::ActorDropped)?
    }

    async fn send(&self, request: CatalogRequest, cancel: &CancellationToken) -> Result<(), CatalogError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            sent = self.sender.send(request) => sent.map_err(|_| CatalogError::ActorClosed),
        }
    }
}

#[async_trait]
impl ResourceSource for CatalogClient {
    type Descriptor = ProjectDescriptor;

    async fn list_page(
        &self,
        continuation: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Page<ProjectDescriptor>, SourceError> {
        Ok(self.list_projects(continuation, cancel).await?)
    }
}

#[async_trait]
impl DeletionSink for CatalogClient {
    async fn delete(&self, name: &str, cancel: &CancellationToken) -> Result<(), DeletionError> {
        self.delete_project(name, cancel).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_actor::{self, CatalogStore};

    #[tokio::test]
    async fn test_list_and_delete_through_actor() {
        let (actor, client) = catalog_actor::new(CatalogStore::in_memory(["b", "a", "c"]), 2);
        let handle = tokio::spawn(actor.run());
        let cancel = CancellationToken::new();

        let page = client.list_page(None, &cancel).await.unwrap();
        assert_eq!(page.items, vec![ProjectDescriptor::new("a"), ProjectDescriptor::new("b")]);
        assert_eq!(page.continuation.as_deref(), Some("b"));

        client.delete("a", &cancel).await.unwrap();
        assert_eq!(
            client.delete("a", &cancel).await,
            Err(DeletionError::NotFound("a".to_string()))
        );

        drop(client);
        let store = handle.await.unwrap();
        assert_eq!(store.names(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_closed_actor_maps_to_unavailable() {
        let (actor, client) = catalog_actor::new(CatalogStore::in_memory(["a"]), 10);
        drop(actor);
        let cancel = CancellationToken::new();

        assert_eq!(client.list_page(None, &cancel).await, Err(SourceError::Unavailable));
        assert_eq!(client.delete("a", &cancel).await, Err(DeletionError::Unavailable));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let (_actor, client) = catalog_actor::new(CatalogStore::in_memory(["a"]), 10);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(client.list_page(None, &cancel).await, Err(SourceError::Cancelled));
        assert_eq!(client.delete("a", &cancel).await, Err(DeletionError::Cancelled));
    }

    #[tokio::test]
    async fn test_delete_cancelled_while_queued_is_skipped() {
        let (actor, client) = catalog_actor::new(CatalogStore::in_memory(["a"]), 10);
        let cancel = CancellationToken::new();

        let pending = tokio::spawn({
            let client = client.clone();
            let cancel = cancel.clone();
            async move { client.delete_project("a", &cancel).await }
        });
        tokio::task::yield_now().await;
        cancel.cancel();

        let handle = tokio::spawn(actor.run());
        assert!(matches!(pending.await.unwrap(), Err(CatalogError::Cancelled)));

        drop(client);
        let store = handle.await.unwrap();
        assert!(store.contains("a"));
    }

    #[tokio::test]
    async fn test_committed_delete_survives_later_cancellation() {
        let (actor, client) = catalog_actor::new(CatalogStore::in_memory(["a", "b"]), 10);
        let handle = tokio::spawn(actor.run());
        let cancel = CancellationToken::new();

        {
            let delete = client.delete_project("a", &cancel);
            futures::pin_mut!(delete);
            assert!(futures::poll!(delete.as_mut()).is_pending());

            // Let the actor commit the delete before the token fires.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            cancel.cancel();

            assert_eq!(delete.await.unwrap().name, "a");
        }
        assert_eq!(client.delete("a", &cancel).await, Err(DeletionError::Cancelled));

        drop(client);
        let store = handle.await.unwrap();
        assert_eq!(store.names(), vec!["b"]);
    }
}
