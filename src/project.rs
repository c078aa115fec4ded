// src/project.rs
use serde::{Deserialize, Serialize};

use crate::cache::Entity;
use crate::flag::Flag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Share identifier issued by the backend, used in public URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<ProjectFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Listings may carry bare flag ids where the details endpoint embeds whole flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectFlags {
    Embedded(Vec<Flag>),
    Referenced(Vec<String>),
}

impl ProjectFlags {
    pub fn len(&self) -> usize {
        match self {
            ProjectFlags::Embedded(flags) => flags.len(),
            ProjectFlags::Referenced(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Project {
    pub fn flag_count(&self) -> usize {
        self.flags.as_ref().map_or(0, ProjectFlags::len)
    }

    /// Flags shipped inline with the project; empty when only ids were sent.
    pub fn embedded_flags(&self) -> &[Flag] {
        match &self.flags {
            Some(ProjectFlags::Embedded(flags)) => flags,
            _ => &[],
        }
    }
}

impl Entity for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    fn merge(&mut self, update: Self) {
        if !update.name.is_empty() {
            self.name = update.name;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if update.project_id.is_some() {
            self.project_id = update.project_id;
        }
        if update.flags.is_some() {
            self.flags = update.flags;
        }
        if update.created_at.is_some() {
            self.created_at = update.created_at;
        }
        if update.updated_at.is_some() {
            self.updated_at = update.updated_at;
        }
    }
}

/// Body of `POST /projects/createProject`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

/// Body of `PUT /projects/updateProject`, minus the project id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPatch {
    pub name: String,
    pub description: String,
}
