//! Lazy pagination over a [`ResourceSource`].

use crate::framework::{ResourceSource, SourceError};
use futures::Stream;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Flattens a paginated source into a stream of descriptors.
///
/// The next page is only requested once every item of the previous page has
/// been pulled. The stream ends after the last page, or right after yielding
/// the first error; no further pages are requested after a failure.
///
/// A continuation token that was already handed out once means the source is
/// cycling, and ends the stream with [`SourceError::StalledContinuation`].
pub fn paginate<S>(
    source: Arc<S>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<S::Descriptor, SourceError>> + Send + Unpin
where
    S: ResourceSource,
{
    // Boxed so the returned stream is Unpin.
    Box::pin(async_stream::try_stream! {
        let mut continuation: Option<String> = None;
        let mut seen = HashSet::new();
        let mut page_number = 0usize;
        loop {
            let page = source.list_page(continuation.take(), &cancel).await?;
            page_number += 1;
            debug!(page = page_number, items = page.items.len(), "Fetched page");

            for item in page.items {
                yield item;
            }

            match page.continuation {
                Some(next) if !seen.insert(next.clone()) => {
                    Err::<(), _>(SourceError::StalledContinuation(next))?;
                }
                Some(next) => continuation = Some(next),
                None => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockSource;
    use crate::framework::Page;
    use crate::model::ProjectDescriptor;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out the tokens in `cycle` forever, one item per page.
    struct CyclingSource {
        cycle: Vec<&'static str>,
        pulls: AtomicUsize,
    }

    impl CyclingSource {
        fn new(cycle: Vec<&'static str>) -> Self {
            Self {
                cycle,
                pulls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ResourceSource for CyclingSource {
        type Descriptor = ProjectDescriptor;

        async fn list_page(
            &self,
            _continuation: Option<String>,
            _cancel: &CancellationToken,
        ) -> Result<Page<ProjectDescriptor>, SourceError> {
            let n = self.pulls.fetch_add(1, Ordering::SeqCst);
            let token = self.cycle[n % self.cycle.len()];
            Ok(Page::with_continuation(vec![ProjectDescriptor::new(format!("p{n}"))], token))
        }
    }

    #[tokio::test]
    async fn test_flattens_pages_in_order() {
        let source = Arc::new(MockSource::new().page(["a", "b"]).page(["c"]).page(["d"]));
        let names: Vec<String> = paginate(source.clone(), CancellationToken::new())
            .map(|item| item.unwrap().name)
            .collect()
            .await;

        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(source.pulls(), 3);
    }

    #[tokio::test]
    async fn test_pages_are_fetched_lazily() {
        let source = Arc::new(MockSource::new().page(["a", "b"]).page(["c"]));
        let stream = paginate(source.clone(), CancellationToken::new());
        futures::pin_mut!(stream);

        assert_eq!(stream.next().await.unwrap().unwrap().name, "a");
        assert_eq!(stream.next().await.unwrap().unwrap().name, "b");
        assert_eq!(source.pulls(), 1);

        assert_eq!(stream.next().await.unwrap().unwrap().name, "c");
        assert_eq!(source.pulls(), 2);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stops_after_first_error() {
        let source = Arc::new(MockSource::new().page(["a"]).fail("connection reset"));
        let items: Vec<_> = paginate(source.clone(), CancellationToken::new()).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(
            items[1],
            Err(SourceError::Transport("connection reset".to_string()))
        );
        assert_eq!(source.pulls(), 2);
    }

    #[tokio::test]
    async fn test_empty_source() {
        let source = Arc::new(MockSource::new());
        let items: Vec<_> = paginate(source, CancellationToken::new()).collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_token_is_stalled() {
        let source = Arc::new(CyclingSource::new(vec!["A"]));
        let items: Vec<_> = paginate(source.clone(), CancellationToken::new())
            .take(100)
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok() && items[1].is_ok());
        assert_eq!(items[2], Err(SourceError::StalledContinuation("A".to_string())));
        assert_eq!(source.pulls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_alternating_tokens_are_stalled() {
        let source = Arc::new(CyclingSource::new(vec!["A", "B"]));
        let items: Vec<_> = paginate(source.clone(), CancellationToken::new())
            .take(100)
            .collect()
            .await;

        assert_eq!(items.len(), 4);
        assert_eq!(items[3], Err(SourceError::StalledContinuation("A".to_string())));
        assert_eq!(source.pulls.load(Ordering::SeqCst), 3);
    }
}
