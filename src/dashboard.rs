// src/dashboard.rs
use std::collections::HashMap;

use log::{debug, warn};

use crate::cache::ListCache;
use crate::editor::ProjectSettingsEditor;
use crate::flag::Flag;
use crate::notify::Notifier;
use crate::project::Project;
use crate::remote::{RemoteCollection, Toggle};
use crate::DeckError;

/// What to do with an optimistic toggle when the backend call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TogglePolicy {
    /// Leave the local flip in place; the next load reconciles it.
    #[default]
    KeepOptimistic,
    RevertOnFailure,
}

/// Projects of the signed-in user plus the flags of every project opened so far.
#[derive(Debug, Default)]
pub struct Dashboard {
    projects: ListCache<Project>,
    flags: HashMap<String, ListCache<Flag>>,
    toggle_policy: TogglePolicy,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toggle_policy(mut self, policy: TogglePolicy) -> Self {
        self.toggle_policy = policy;
        self
    }

    pub fn toggle_policy(&self) -> TogglePolicy {
        self.toggle_policy
    }

    pub fn projects(&self) -> &ListCache<Project> {
        &self.projects
    }

    pub fn projects_mut(&mut self) -> &mut ListCache<Project> {
        &mut self.projects
    }

    pub fn flags(&self, project_id: &str) -> Option<&ListCache<Flag>> {
        self.flags.get(project_id)
    }

    pub fn flags_mut(&mut self, project_id: &str) -> &mut ListCache<Flag> {
        self.flags.entry(project_id.to_string()).or_default()
    }

    // Flag cache of a project opened earlier. Never creates one.
    fn opened(&mut self, project_id: &str) -> Result<&mut ListCache<Flag>, DeckError> {
        self.flags.get_mut(project_id).ok_or_else(|| {
            DeckError::Precondition(format!("Project {} is not open", project_id))
        })
    }

    /// Flags loaded for the project if it was opened, else the count it was listed with.
    pub fn flag_count(&self, project_id: &str) -> usize {
        match self.flags.get(project_id) {
            Some(flags) => flags.len(),
            None => self.projects.get(project_id).map_or(0, Project::flag_count),
        }
    }

    pub fn clear(&mut self) {
        self.projects.clear();
        self.flags.clear();
    }

    /// Replaces the project list. On failure the list is emptied.
    pub async fn load_projects<R>(
        &mut self,
        remote: &R,
        notices: &mut dyn Notifier,
    ) -> Result<(), DeckError>
    where
        R: RemoteCollection<Entity = Project> + ?Sized,
    {
        match remote.list().await {
            Ok(projects) => {
                debug!("loaded {} projects", projects.len());
                self.projects.refresh(projects);
                Ok(())
            }
            Err(e) => {
                self.projects.clear();
                notices.error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Loads a project's flags into its own cache. On failure that cache is left empty.
    pub async fn open_project<R>(
        &mut self,
        project_id: &str,
        remote: &R,
    ) -> Result<&ListCache<Flag>, DeckError>
    where
        R: RemoteCollection<Entity = Flag> + ?Sized,
    {
        let loaded = remote.list().await;
        let cache = self.flags.entry(project_id.to_string()).or_default();
        match loaded {
            Ok(flags) => {
                cache.refresh(flags);
                Ok(&*cache)
            }
            Err(e) => {
                warn!("could not load flags of project {}: {}", project_id, e);
                cache.clear();
                Err(e)
            }
        }
    }

    /// Flips the flag locally before asking the backend to do the same.
    /// Returns the new local state.
    pub async fn toggle_flag<R>(
        &mut self,
        project_id: &str,
        flag_id: &str,
        remote: &R,
        notices: &mut dyn Notifier,
    ) -> Result<bool, DeckError>
    where
        R: Toggle + ?Sized,
    {
        let policy = self.toggle_policy;
        let next = self
            .opened(project_id)?
            .toggle(flag_id)
            .ok_or_else(|| DeckError::Precondition(format!("Unknown flag {}", flag_id)))?;

        match remote.toggle(flag_id).await {
            Ok(()) => Ok(next),
            Err(e) => {
                warn!("toggle of flag {} failed: {}", flag_id, e);
                if policy == TogglePolicy::RevertOnFailure {
                    if let Some(cache) = self.flags.get_mut(project_id) {
                        cache.set_enabled(flag_id, !next);
                    }
                }
                notices.error("Error while toggling flag state");
                Err(e)
            }
        }
    }

    /// Removes the flag locally only once the backend confirmed the delete.
    /// The project must have been opened first.
    pub async fn delete_flag<R>(
        &mut self,
        project_id: &str,
        flag_id: &str,
        remote: &R,
        notices: &mut dyn Notifier,
    ) -> Result<(), DeckError>
    where
        R: RemoteCollection<Entity = Flag> + ?Sized,
    {
        self.opened(project_id)?;
        match remote.delete(flag_id).await {
            Ok(()) => {
                if let Some(cache) = self.flags.get_mut(project_id) {
                    cache.remove(flag_id);
                }
                notices.success("Flag deleted successfully");
                Ok(())
            }
            Err(e) => {
                notices.error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Deletes the project and forgets its flags.
    pub async fn delete_project<R>(
        &mut self,
        project_id: &str,
        remote: &R,
        notices: &mut dyn Notifier,
    ) -> Result<(), DeckError>
    where
        R: RemoteCollection<Entity = Project> + ?Sized,
    {
        let project = self
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| DeckError::Precondition(format!("Unknown project {}", project_id)))?;

        let mut editor = ProjectSettingsEditor::new(&project);
        editor.delete(remote, &mut self.projects, notices).await?;
        self.flags.remove(project_id);
        Ok(())
    }
}
