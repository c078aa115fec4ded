// src/explorer.rs
//! Raw calls against the documented endpoints, for trying the API by hand.

use log::debug;
use reqwest::Method;
use serde_json::{json, Map, Value};

use crate::flag::{enabled_to_wire, Environment, NewFlag};
use crate::notify::Notifier;
use crate::project::NewProject;
use crate::Client;

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerCall {
    ProjectDetails {
        api_key: String,
        project_id: String,
    },
    CreateProject(NewProject),
    CreateFlag {
        project_id: String,
        flag: NewFlag,
    },
    /// Blank fields are left out of the request body.
    UpdateFlag {
        flag_id: String,
        name: Option<String>,
        description: Option<String>,
        environment: Option<Environment>,
        enabled: bool,
    },
    DeleteFlag {
        flag_id: String,
    },
}

impl ExplorerCall {
    pub fn method(&self) -> Method {
        match self {
            ExplorerCall::ProjectDetails { .. } => Method::GET,
            ExplorerCall::CreateProject(_) | ExplorerCall::CreateFlag { .. } => Method::POST,
            ExplorerCall::UpdateFlag { .. } => Method::PUT,
            ExplorerCall::DeleteFlag { .. } => Method::DELETE,
        }
    }

    pub fn path(&self) -> String {
        match self {
            ExplorerCall::ProjectDetails { api_key, project_id } => {
                format!("/projects/getProjectDetails/{}/{}", api_key, project_id)
            }
            ExplorerCall::CreateProject(_) => "/projects/createProject".to_string(),
            ExplorerCall::CreateFlag { project_id, .. } => {
                format!("/flags/createFlag/{}", project_id)
            }
            ExplorerCall::UpdateFlag { .. } => "/flags/updateFlag".to_string(),
            ExplorerCall::DeleteFlag { flag_id } => format!("/flags/deleteFlag/{}", flag_id),
        }
    }

    pub fn body(&self) -> Option<Value> {
        match self {
            ExplorerCall::ProjectDetails { .. } | ExplorerCall::DeleteFlag { .. } => None,
            ExplorerCall::CreateProject(project) => Some(json!(project)),
            ExplorerCall::CreateFlag { flag, .. } => Some(json!(flag)),
            ExplorerCall::UpdateFlag {
                flag_id,
                name,
                description,
                environment,
                enabled,
            } => {
                let mut body = Map::new();
                body.insert("flagId".to_string(), json!(flag_id));
                let present =
                    |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
                if let Some(name) = present(name) {
                    body.insert("name".to_string(), json!(name));
                }
                if let Some(description) = present(description) {
                    body.insert("description".to_string(), json!(description));
                }
                if let Some(env) = environment {
                    body.insert("environment".to_string(), json!(env.as_str()));
                }
                body.insert("isEnabled".to_string(), json!(enabled_to_wire(*enabled)));
                Some(Value::Object(body))
            }
        }
    }

    pub fn loading_message(&self) -> &'static str {
        match self {
            ExplorerCall::ProjectDetails { .. } => "Fetching project & flags...",
            ExplorerCall::CreateProject(_) => "Creating project...",
            ExplorerCall::CreateFlag { .. } => "Creating flag...",
            ExplorerCall::UpdateFlag { .. } => "Updating flag...",
            ExplorerCall::DeleteFlag { .. } => "Deleting flag...",
        }
    }

    /// Shell command reproducing this call against `base_url`.
    pub fn curl(&self, base_url: &str) -> String {
        let url = format!("{}{}", base_url.trim_end_matches('/'), self.path());
        let method = self.method();
        if method == Method::GET {
            return format!("curl -s \"{}\" | jq", url);
        }
        match self.body() {
            Some(body) => format!(
                "curl -X {} \\\n  \"{}\" \\\n  -H \"Content-Type: application/json\" \\\n  --cookie \"accessToken=<TOKEN>\" \\\n  -d '{}'",
                method, url, body
            ),
            None => format!(
                "curl -X {} \\\n  \"{}\" \\\n  --cookie \"accessToken=<TOKEN>\"",
                method, url
            ),
        }
    }
}

/// Link a project card hands out for public reads.
pub fn share_url(base_url: &str, api_key: &str, share_id: &str) -> String {
    format!(
        "{}/projects/getProject/{}/{}",
        base_url.trim_end_matches('/'),
        api_key,
        share_id
    )
}

pub fn public_details_url(base_url: &str, api_key: &str, project_id: &str) -> String {
    format!(
        "{}/projects/getProjectDetails/{}/{}",
        base_url.trim_end_matches('/'),
        api_key,
        project_id
    )
}

pub struct Explorer<'a> {
    client: &'a Client,
}

impl<'a> Explorer<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Runs `call` and returns the response body untouched, or `{"error": ...}`.
    pub async fn call(&self, call: &ExplorerCall, notices: &mut dyn Notifier) -> Value {
        debug!("{}", call.loading_message());
        let mut request = self.client.request(call.method(), &call.path());
        if let Some(body) = call.body() {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                notices.error(&e.to_string());
                return json!({ "error": e.to_string() });
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                notices.error(&e.to_string());
                return json!({ "error": e.to_string() });
            }
        };
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if status.is_success() {
            notices.success("Done");
            body
        } else {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            notices.error(&message);
            json!({ "error": body })
        }
    }
}
