// src/remote.rs
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;

use crate::cache::Entity;
use crate::flag::{Flag, FlagPatch, NewFlag};
use crate::project::{NewProject, Project, ProjectFlags, ProjectPatch};
use crate::{Client, DeckError};

/// One remote entity collection. Every call is a single request with no retry.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    type Entity: Entity;
    type Input: Send + Sync;
    type Patch: Send + Sync;

    async fn create(&self, input: &Self::Input) -> Result<Self::Entity, DeckError>;
    async fn list(&self) -> Result<Vec<Self::Entity>, DeckError>;
    async fn update(&self, id: &str, patch: &Self::Patch) -> Result<Self::Entity, DeckError>;
    async fn delete(&self, id: &str) -> Result<(), DeckError>;
}

#[async_trait]
pub trait Toggle: Send + Sync {
    /// Asks the backend to flip the flag. The response body is not read back.
    async fn toggle(&self, id: &str) -> Result<(), DeckError>;
}

/// The signed-in user's projects.
pub struct Projects<'a> {
    client: &'a Client,
}

/// Flags of one project.
pub struct Flags<'a> {
    client: &'a Client,
    project_id: String,
}

impl<'a> Flags<'a> {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl Client {
    pub fn projects(&self) -> Projects<'_> {
        Projects { client: self }
    }

    pub fn flags(&self, project_id: &str) -> Flags<'_> {
        Flags {
            client: self,
            project_id: project_id.to_string(),
        }
    }

    pub async fn project_details(&self, id: &str) -> Result<Project, DeckError> {
        let path = format!("/projects/getProjectDetails/{}", id);
        self.fetch(self.request(Method::GET, &path)).await
    }

    /// Unauthenticated read keyed by the user's API key and the project's share id.
    pub async fn public_project(
        &self,
        api_key: &str,
        project_id: &str,
    ) -> Result<Project, DeckError> {
        let path = format!("/projects/getProjectDetails/{}/{}", api_key, project_id);
        self.fetch(self.request(Method::GET, &path)).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectUpdate<'p> {
    project_id: &'p str,
    #[serde(flatten)]
    patch: &'p ProjectPatch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlagUpdate<'p> {
    flag_id: &'p str,
    #[serde(flatten)]
    patch: &'p FlagPatch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlagRef<'p> {
    flag_id: &'p str,
}

#[async_trait]
impl<'a> RemoteCollection for Projects<'a> {
    type Entity = Project;
    type Input = NewProject;
    type Patch = ProjectPatch;

    async fn create(&self, input: &NewProject) -> Result<Project, DeckError> {
        let request = self
            .client
            .request(Method::POST, "/projects/createProject")
            .json(input);
        self.client.fetch(request).await
    }

    async fn list(&self) -> Result<Vec<Project>, DeckError> {
        let request = self
            .client
            .request(Method::GET, "/projects/getAllProjectsByUser");
        Ok(self
            .client
            .execute::<Vec<Project>>(request)
            .await?
            .unwrap_or_default())
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> Result<Project, DeckError> {
        let request = self
            .client
            .request(Method::PUT, "/projects/updateProject")
            .json(&ProjectUpdate { project_id: id, patch });
        self.client.fetch(request).await
    }

    async fn delete(&self, id: &str) -> Result<(), DeckError> {
        let path = format!("/projects/deleteProject/{}", id);
        self.client
            .execute::<serde_json::Value>(self.client.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<'a> RemoteCollection for Flags<'a> {
    type Entity = Flag;
    type Input = NewFlag;
    type Patch = FlagPatch;

    async fn create(&self, input: &NewFlag) -> Result<Flag, DeckError> {
        let path = format!("/flags/createFlag/{}", self.project_id);
        let request = self.client.request(Method::POST, &path).json(input);
        self.client.fetch(request).await
    }

    async fn list(&self) -> Result<Vec<Flag>, DeckError> {
        let project = self.client.project_details(&self.project_id).await?;
        match project.flags {
            None => Ok(Vec::new()),
            Some(ProjectFlags::Embedded(flags)) => Ok(flags),
            Some(ProjectFlags::Referenced(_)) => Err(DeckError::MalformedResponse(
                "project details carried flag ids instead of flags".to_string(),
            )),
        }
    }

    async fn update(&self, id: &str, patch: &FlagPatch) -> Result<Flag, DeckError> {
        let request = self
            .client
            .request(Method::PUT, "/flags/updateFlag")
            .json(&FlagUpdate { flag_id: id, patch });
        self.client.fetch(request).await
    }

    async fn delete(&self, id: &str) -> Result<(), DeckError> {
        let path = format!("/flags/deleteFlag/{}", id);
        self.client
            .execute::<serde_json::Value>(self.client.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<'a> Toggle for Flags<'a> {
    async fn toggle(&self, id: &str) -> Result<(), DeckError> {
        let request = self
            .client
            .request(Method::POST, "/flags/toggleFlagState")
            .json(&FlagRef { flag_id: id });
        self.client.execute::<serde_json::Value>(request).await?;
        Ok(())
    }
}
