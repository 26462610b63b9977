use crate::framework::Descriptor;
use serde::{Deserialize, Serialize};

/// A project as returned by the listing endpoint. Identified by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
}

impl ProjectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Descriptor for ProjectDescriptor {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A project record as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn descriptor(&self) -> ProjectDescriptor {
        ProjectDescriptor::new(self.name.clone())
    }
}
