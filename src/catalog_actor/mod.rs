//! Local project catalog served by an actor.

pub mod actor;
pub mod error;
pub mod store;

pub use actor::{CatalogActor, CatalogRequest, Response};
pub use error::*;
pub use store::CatalogStore;

use crate::clients::CatalogClient;

/// Default number of projects per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

const REQUEST_BUFFER: usize = 32;

/// Creates a catalog actor over `store` and its client.
pub fn new(store: CatalogStore, page_size: usize) -> (CatalogActor, CatalogClient) {
    let (actor, sender) = CatalogActor::new(REQUEST_BUFFER, store);
    (actor, CatalogClient::new(sender, page_size))
}
