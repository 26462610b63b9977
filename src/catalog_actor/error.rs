//! Error types for the catalog actor.

use crate::framework::{DeletionError, SourceError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested project was not found.
    #[error("Project not found: {0}")]
    NotFound(String),

    /// The catalog file could not be read or written.
    #[error("Catalog I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON.
    #[error("Catalog file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Catalog actor closed")]
    ActorClosed,

    #[error("Catalog actor dropped response channel")]
    ActorDropped,

    #[error("Catalog actor failed: {0}")]
    ActorFailed(String),

    #[error("Catalog request cancelled")]
    Cancelled,
}

impl From<CatalogError> for SourceError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Cancelled => SourceError::Cancelled,
            CatalogError::ActorClosed | CatalogError::ActorDropped => SourceError::Unavailable,
            other => SourceError::Transport(other.to_string()),
        }
    }
}

impl From<CatalogError> for DeletionError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(name) => DeletionError::NotFound(name),
            CatalogError::Cancelled => DeletionError::Cancelled,
            CatalogError::ActorClosed | CatalogError::ActorDropped => DeletionError::Unavailable,
            other => DeletionError::Rejected(other.to_string()),
        }
    }
}
