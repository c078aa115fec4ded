// src/editor.rs
//! Form state for creating and editing projects and flags.
//!
//! Every editor runs the same cycle: `Idle -> Submitting -> Succeeded | Failed`.
//! A submit issues exactly one remote call. On success the returned entity is
//! merged into the caller's [`ListCache`] and the form resets; on failure the
//! fields are left alone so the user can fix them and retry.

use log::debug;

use crate::cache::ListCache;
use crate::flag::{Environment, Flag, FlagPatch, NewFlag};
use crate::notify::Notifier;
use crate::project::{NewProject, Project, ProjectPatch};
use crate::remote::RemoteCollection;
use crate::DeckError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

impl EditorState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, EditorState::Submitting)
    }

    /// Inline error message left by the last failed submission.
    pub fn error(&self) -> Option<&str> {
        match self {
            EditorState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn begin(&mut self) -> Result<(), DeckError> {
        if self.is_submitting() {
            return Err(DeckError::Busy);
        }
        *self = EditorState::Submitting;
        Ok(())
    }

    /// Records the outcome and relays it. Success messages come from the caller.
    pub(crate) fn settle<T>(
        &mut self,
        result: Result<T, DeckError>,
        notices: &mut dyn Notifier,
        success: &str,
    ) -> Result<T, DeckError> {
        match result {
            Ok(value) => {
                *self = EditorState::Succeeded;
                notices.success(success);
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                debug!("submission failed: {}", message);
                notices.error(&message);
                *self = EditorState::Failed(message);
                Err(e)
            }
        }
    }
}

/// Fails with the first `(label, value)` whose value is blank.
pub(crate) fn require(fields: &[(&str, &str)]) -> Result<(), DeckError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((label, _)) => Err(DeckError::Precondition(format!("{} is required", label))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectCreateEditor {
    pub name: String,
    pub description: String,
    state: EditorState,
}

impl ProjectCreateEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Back to `Idle` after an abandoned submit. Typed fields are kept.
    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.description.clear();
        self.state = EditorState::Idle;
    }

    pub async fn submit<R>(
        &mut self,
        remote: &R,
        cache: &mut ListCache<Project>,
        notices: &mut dyn Notifier,
    ) -> Result<Project, DeckError>
    where
        R: RemoteCollection<Entity = Project, Input = NewProject> + ?Sized,
    {
        self.state.begin()?;

        let required = [
            ("Name", self.name.as_str()),
            ("Description", self.description.as_str()),
        ];
        let result = match require(&required) {
            Ok(()) => {
                let input = NewProject {
                    name: self.name.trim().to_string(),
                    description: self.description.trim().to_string(),
                };
                remote.create(&input).await
            }
            Err(e) => Err(e),
        };

        let result = result.map(|project| {
            cache.insert_front(project.clone());
            self.name.clear();
            self.description.clear();
            project
        });
        self.state.settle(result, notices, "Project Created Successfully")
    }
}

/// Settings tab of an open project: rename, redescribe or delete it.
#[derive(Debug, Clone)]
pub struct ProjectSettingsEditor {
    project_id: String,
    pub name: String,
    pub description: String,
    state: EditorState,
}

impl ProjectSettingsEditor {
    pub fn new(project: &Project) -> Self {
        Self {
            project_id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone().unwrap_or_default(),
            state: EditorState::Idle,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    pub async fn submit<R>(
        &mut self,
        remote: &R,
        cache: &mut ListCache<Project>,
        notices: &mut dyn Notifier,
    ) -> Result<Project, DeckError>
    where
        R: RemoteCollection<Entity = Project, Patch = ProjectPatch> + ?Sized,
    {
        self.state.begin()?;

        let result = match require(&[("Name", self.name.as_str())]) {
            Ok(()) => {
                let patch = ProjectPatch {
                    name: self.name.trim().to_string(),
                    description: self.description.trim().to_string(),
                };
                remote.update(&self.project_id, &patch).await
            }
            Err(e) => Err(e),
        };

        let result = result.map(|updated| {
            let merged = match cache.merge(updated.clone()) {
                Some(merged) => merged.clone(),
                None => updated,
            };
            self.name = merged.name.clone();
            self.description = merged.description.clone().unwrap_or_default();
            merged
        });
        self.state.settle(result, notices, "Project updated")
    }

    /// Deletes the project remotely, then drops it from `cache`.
    pub async fn delete<R>(
        &mut self,
        remote: &R,
        cache: &mut ListCache<Project>,
        notices: &mut dyn Notifier,
    ) -> Result<(), DeckError>
    where
        R: RemoteCollection<Entity = Project> + ?Sized,
    {
        self.state.begin()?;
        let result = remote.delete(&self.project_id).await.map(|()| {
            cache.remove(&self.project_id);
        });
        self.state.settle(result, notices, "Project deleted")
    }
}

#[derive(Debug, Clone)]
pub struct FlagCreateEditor {
    pub name: String,
    pub description: String,
    pub environment: Environment,
    pub enabled: bool,
    state: EditorState,
}

impl Default for FlagCreateEditor {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            environment: Environment::Development,
            enabled: true,
            state: EditorState::Idle,
        }
    }
}

impl FlagCreateEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub async fn submit<R>(
        &mut self,
        remote: &R,
        cache: &mut ListCache<Flag>,
        notices: &mut dyn Notifier,
    ) -> Result<Flag, DeckError>
    where
        R: RemoteCollection<Entity = Flag, Input = NewFlag> + ?Sized,
    {
        self.state.begin()?;

        let required = [
            ("Name", self.name.as_str()),
            ("Description", self.description.as_str()),
        ];
        let result = match require(&required) {
            Ok(()) => {
                let input = NewFlag {
                    name: self.name.trim().to_string(),
                    description: self.description.trim().to_string(),
                    environment: self.environment.clone(),
                    is_enabled: self.enabled,
                };
                remote.create(&input).await
            }
            Err(e) => Err(e),
        };

        let result = result.map(|flag| {
            cache.insert_front(flag.clone());
            self.name.clear();
            self.description.clear();
            self.environment = Environment::Development;
            self.enabled = true;
            flag
        });
        self.state.settle(result, notices, "Flag created successfully")
    }
}

#[derive(Debug, Clone)]
pub struct FlagEditEditor {
    flag_id: String,
    pub name: String,
    pub description: String,
    pub environment: Environment,
    pub enabled: bool,
    state: EditorState,
}

impl FlagEditEditor {
    pub fn new(flag: &Flag) -> Self {
        Self {
            flag_id: flag.id.clone(),
            name: flag.name.clone(),
            description: flag.description.clone().unwrap_or_default(),
            environment: flag.environment.clone().unwrap_or_default(),
            enabled: flag.enabled(),
            state: EditorState::Idle,
        }
    }

    pub fn flag_id(&self) -> &str {
        &self.flag_id
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    pub async fn submit<R>(
        &mut self,
        remote: &R,
        cache: &mut ListCache<Flag>,
        notices: &mut dyn Notifier,
    ) -> Result<Flag, DeckError>
    where
        R: RemoteCollection<Entity = Flag, Patch = FlagPatch> + ?Sized,
    {
        self.state.begin()?;

        let result = match require(&[("Name", self.name.as_str())]) {
            Ok(()) => {
                let patch = FlagPatch {
                    name: self.name.trim().to_string(),
                    description: self.description.trim().to_string(),
                    environment: self.environment.clone(),
                    is_enabled: self.enabled,
                };
                remote.update(&self.flag_id, &patch).await
            }
            Err(e) => Err(e),
        };

        let result = result.map(|updated| {
            let merged = match cache.merge(updated.clone()) {
                Some(merged) => merged.clone(),
                None => updated,
            };
            self.name = merged.name.clone();
            self.description = merged.description.clone().unwrap_or_default();
            if let Some(env) = &merged.environment {
                self.environment = env.clone();
            }
            self.enabled = merged.enabled();
            merged
        });
        self.state.settle(result, notices, "Flag updated")
    }
}
