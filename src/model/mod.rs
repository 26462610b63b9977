//! Pure data structures: the listed [`ProjectDescriptor`] and the catalog's [`Project`] record.

pub mod project;

pub use project::*;
