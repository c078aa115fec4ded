// src/context.rs
use log::{debug, warn};

use crate::dashboard::Dashboard;
use crate::editor::{FlagCreateEditor, FlagEditEditor, ProjectCreateEditor, ProjectSettingsEditor};
use crate::explorer;
use crate::flag::Flag;
use crate::notify::{Notifier, ToastQueue};
use crate::project::Project;
use crate::session::{LoginForm, SignupForm, User};
use crate::{Client, DeckError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Everything one signed-in (or signed-out) user session holds.
///
/// Call [`AppContext::init`] once after construction to pick up an existing
/// session; [`AppContext::logout`] tears it down again.
pub struct AppContext {
    client: Client,
    session: Option<User>,
    theme: Theme,
    notices: ToastQueue,
    dashboard: Dashboard,
}

impl AppContext {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            session: None,
            theme: Theme::default(),
            notices: ToastQueue::new(),
            dashboard: Dashboard::new(),
        }
    }

    pub fn with_dashboard(mut self, dashboard: Dashboard) -> Self {
        self.dashboard = dashboard;
        self
    }

    pub fn with_notices(mut self, notices: ToastQueue) -> Self {
        self.notices = notices;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn session(&self) -> Option<&User> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn notices(&self) -> &ToastQueue {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut ToastQueue {
        &mut self.notices
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    /// Fetches the current session. A failure just means nobody is signed in.
    pub async fn init(&mut self) -> Option<&User> {
        match self.client.user_info().await {
            Ok(user) => {
                debug!("session restored for {}", user.username);
                self.session = Some(user);
            }
            Err(e) => {
                debug!("no active session: {}", e);
                self.session = None;
            }
        }
        self.session.as_ref()
    }

    pub async fn login(&mut self, form: &mut LoginForm) -> Result<&User, DeckError> {
        let user = form.submit(&self.client, &mut self.notices).await?;
        self.dashboard.clear();
        Ok(&*self.session.insert(user))
    }

    pub async fn signup(&mut self, form: &mut SignupForm) -> Result<Option<User>, DeckError> {
        form.submit(&self.client, &mut self.notices).await
    }

    /// Ends the session. Local state is only dropped once the backend agrees.
    pub async fn logout(&mut self) -> Result<(), DeckError> {
        match self.client.logout().await {
            Ok(()) => {
                self.session = None;
                self.dashboard.clear();
                self.notices.success("Logout successful");
                Ok(())
            }
            Err(e) => {
                warn!("logout failed: {}", e);
                self.notices.error("Error while logging out");
                Err(e)
            }
        }
    }

    fn require_session(&self) -> Result<&User, DeckError> {
        self.session.as_ref().ok_or(DeckError::Unauthenticated)
    }

    pub async fn load_projects(&mut self) -> Result<&[Project], DeckError> {
        self.require_session()?;
        self.dashboard
            .load_projects(&self.client.projects(), &mut self.notices)
            .await?;
        Ok(self.dashboard.projects().entries())
    }

    pub async fn open_project(&mut self, project_id: &str) -> Result<&[Flag], DeckError> {
        self.require_session()?;
        let flags = self
            .dashboard
            .open_project(project_id, &self.client.flags(project_id))
            .await?;
        Ok(flags.entries())
    }

    pub async fn create_project(
        &mut self,
        editor: &mut ProjectCreateEditor,
    ) -> Result<Project, DeckError> {
        self.require_session()?;
        editor
            .submit(
                &self.client.projects(),
                self.dashboard.projects_mut(),
                &mut self.notices,
            )
            .await
    }

    pub async fn save_project(
        &mut self,
        editor: &mut ProjectSettingsEditor,
    ) -> Result<Project, DeckError> {
        self.require_session()?;
        editor
            .submit(
                &self.client.projects(),
                self.dashboard.projects_mut(),
                &mut self.notices,
            )
            .await
    }

    pub async fn delete_project(&mut self, project_id: &str) -> Result<(), DeckError> {
        self.require_session()?;
        self.dashboard
            .delete_project(project_id, &self.client.projects(), &mut self.notices)
            .await
    }

    pub async fn create_flag(
        &mut self,
        project_id: &str,
        editor: &mut FlagCreateEditor,
    ) -> Result<Flag, DeckError> {
        self.require_session()?;
        editor
            .submit(
                &self.client.flags(project_id),
                self.dashboard.flags_mut(project_id),
                &mut self.notices,
            )
            .await
    }

    pub async fn save_flag(
        &mut self,
        project_id: &str,
        editor: &mut FlagEditEditor,
    ) -> Result<Flag, DeckError> {
        self.require_session()?;
        editor
            .submit(
                &self.client.flags(project_id),
                self.dashboard.flags_mut(project_id),
                &mut self.notices,
            )
            .await
    }

    pub async fn toggle_flag(
        &mut self,
        project_id: &str,
        flag_id: &str,
    ) -> Result<bool, DeckError> {
        self.require_session()?;
        self.dashboard
            .toggle_flag(
                project_id,
                flag_id,
                &self.client.flags(project_id),
                &mut self.notices,
            )
            .await
    }

    pub async fn delete_flag(&mut self, project_id: &str, flag_id: &str) -> Result<(), DeckError> {
        self.require_session()?;
        self.dashboard
            .delete_flag(
                project_id,
                flag_id,
                &self.client.flags(project_id),
                &mut self.notices,
            )
            .await
    }

    /// Public URL for the project, if both the user's API key and the share id are known.
    pub fn share_url(&self, project: &Project) -> Option<String> {
        let api_key = self.session.as_ref()?.api_key.as_deref()?;
        let share_id = project.project_id.as_deref()?;
        Some(explorer::share_url(self.client.base_url(), api_key, share_id))
    }
}
