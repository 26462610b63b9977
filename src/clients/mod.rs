//! Type-safe handles for the actors in this crate.

pub mod catalog_client;

pub use catalog_client::*;
