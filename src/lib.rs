// src/lib.rs
use std::env;
use std::sync::RwLock;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub mod cache;
pub mod context;
pub mod dashboard;
pub mod editor;
pub mod explorer;
pub mod flag;
pub mod notify;
pub mod project;
pub mod remote;
pub mod session;
mod tests;

pub use crate::cache::{Entity, ListCache, SortKey};
pub use crate::context::{AppContext, Theme};
pub use crate::dashboard::{Dashboard, TogglePolicy};
pub use crate::flag::{Environment, Flag};
pub use crate::notify::{Notice, Notifier, ToastQueue, Tone};
pub use crate::project::{Project, ProjectFlags};
pub use crate::remote::{RemoteCollection, Toggle};
pub use crate::session::User;

const BASE_URL: &str = "http://localhost:8080/api";
const ENV_API_URL: &str = "FLAGDECK_API_URL";
const ENV_ACCESS_TOKEN: &str = "FLAGDECK_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 4xx, or a 2xx envelope reporting `success: false`. Displays the backend message as is.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    Precondition(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("A submission is already in progress")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeckError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DeckError::Rejected { status, .. } | DeckError::Server { status, .. } => Some(*status),
            DeckError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Shape every backend response comes wrapped in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

pub struct Client {
    base_url: String,
    http_client: reqwest::Client,
    access_token: RwLock<Option<String>>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn debug_info(&self) -> String {
        format!(
            "Client {{ base_url: {}, has_token: {} }}",
            self.base_url,
            self.access_token().is_some()
        )
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn set_access_token(&self, token: Option<String>) {
        let mut slot = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = token;
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let request = self.http_client.request(method, &url);
        match self.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends `request` and unwraps the envelope, returning its `data` if any.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, DeckError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Unexpected status code: {}", status));
            warn!("request failed with {}: {}", status, message);
            let status = status.as_u16();
            return Err(if status >= 500 {
                DeckError::Server { status, message }
            } else {
                DeckError::Rejected { status, message }
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| DeckError::MalformedResponse(e.to_string()))?;

        let reported = envelope.status_code.unwrap_or(status.as_u16());
        if !envelope.success || reported >= 400 {
            let message = envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Request failed".to_string());
            warn!("backend rejected request ({}): {}", reported, message);
            return Err(if reported >= 500 {
                DeckError::Server { status: reported, message }
            } else {
                DeckError::Rejected { status: reported, message }
            });
        }

        Ok(envelope.data)
    }

    /// Like [`Client::execute`] but `data` must be present.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, DeckError> {
        self.execute(request)
            .await?
            .ok_or_else(|| DeckError::MalformedResponse("response carried no data".to_string()))
    }
}

pub struct ClientBuilder {
    base_url: String,
    access_token: Option<String>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            access_token: None,
            timeout: None,
        }
    }

    /// Starts from `FLAGDECK_API_URL` and `FLAGDECK_ACCESS_TOKEN` when they are set.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(url) = env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                builder = builder.with_base_url(&url);
            }
        }
        if let Ok(token) = env::var(ENV_ACCESS_TOKEN) {
            if !token.trim().is_empty() {
                builder = builder.with_access_token(&token);
            }
        }
        builder
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client, DeckError> {
        if self.base_url.is_empty() {
            return Err(DeckError::Config("Base URL is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Flagdeck-Rust"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(Client {
            base_url: self.base_url,
            http_client: http.build()?,
            access_token: RwLock::new(self.access_token),
        })
    }
}
