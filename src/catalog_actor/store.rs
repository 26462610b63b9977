//! The catalog's project store.
//!
//! Projects are kept in a `BTreeMap` keyed by name, so listing order is stable
//! and continuation tokens can be plain names: a page resumes strictly after
//! the last name it returned, which means deletions made while a listing is in
//! progress never shift later pages.

use crate::catalog_actor::CatalogError;
use crate::framework::Page;
use crate::model::{Project, ProjectDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::PathBuf;
use tracing::{debug, warn};

/// On-disk layout of a catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug, Default)]
pub struct CatalogStore {
    projects: BTreeMap<String, Project>,
    path: Option<PathBuf>,
}

impl CatalogStore {
    /// A store that is never persisted.
    pub fn in_memory<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self::from_projects(names.into_iter().map(Project::new))
    }

    pub fn from_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        Self {
            projects: projects.into_iter().map(|p| (p.name.clone(), p)).collect(),
            path: None,
        }
    }

    /// Loads a catalog file. Every successful delete rewrites it.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let bytes = tokio::fs::read(&path).await.map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_slice(&bytes).map_err(|source| CatalogError::Malformed {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), projects = file.projects.len(), "Catalog loaded");

        let mut store = Self::from_projects(file.projects);
        store.path = Some(path);
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.projects.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    /// Returns up to `limit` projects named strictly after `after`.
    pub fn page_after(&self, after: Option<&str>, limit: usize) -> Page<ProjectDescriptor> {
        let limit = limit.max(1);
        let lower = match after {
            Some(name) => Bound::Excluded(name),
            None => Bound::Unbounded,
        };

        let mut items: Vec<ProjectDescriptor> = self
            .projects
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit + 1)
            .map(|(_, project)| project.descriptor())
            .collect();

        if items.len() > limit {
            items.truncate(limit);
            let continuation = items.last().map(|d| d.name.clone());
            Page {
                items,
                continuation,
            }
        } else {
            Page::last(items)
        }
    }

    /// Removes `name` and persists the catalog.
    ///
    /// If the file cannot be written the project is put back, so the in-memory
    /// view never diverges from disk.
    pub async fn remove(&mut self, name: &str) -> Result<Project, CatalogError> {
        let project = self
            .projects
            .remove(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;

        if let Err(e) = self.persist().await {
            self.projects.insert(project.name.clone(), project);
            return Err(e);
        }
        Ok(project)
    }

    /// Writes to a sibling temp file, then renames over the catalog.
    async fn persist(&self) -> Result<(), CatalogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = CatalogFile {
            projects: self.projects.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |source| CatalogError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp catalog file");
            }
            return Err(io_err(e));
        }
        Ok(())
    }
}
