// src/session.rs
use log::{debug, warn};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::editor::{require, EditorState};
use crate::notify::Notifier;
use crate::{Client, DeckError};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub email: String,
    /// Credential for public reads of the user's projects.
    #[serde(alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl User {
    /// Full name if known, otherwise the username, with the first letter capitalized.
    pub fn display_name(&self) -> String {
        let raw = self
            .full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username);
        capitalize(raw.trim())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Client {
    /// Signs in. A bearer token in the response replaces any configured one;
    /// otherwise the session rides on the cookies the backend sets.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, DeckError> {
        let request = self.request(Method::POST, "/users/login").json(credentials);
        let data: serde_json::Value = self.fetch(request).await?;

        if let Some(token) = data
            .get("accessToken")
            .or_else(|| data.get("access_token"))
            .and_then(|t| t.as_str())
        {
            debug!("login returned a bearer token");
            self.set_access_token(Some(token.to_string()));
        }

        let user = data.get("user").cloned().unwrap_or(data);
        serde_json::from_value(user).map_err(|e| DeckError::MalformedResponse(e.to_string()))
    }

    pub async fn signup(&self, registration: &Registration) -> Result<Option<User>, DeckError> {
        let request = self
            .request(Method::POST, "/users/signup")
            .json(registration);
        let data: Option<serde_json::Value> = self.execute(request).await?;
        match data {
            Some(value) if value.is_object() => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| DeckError::MalformedResponse(e.to_string())),
            _ => Ok(None),
        }
    }

    /// Ends the session remotely and forgets the bearer token.
    pub async fn logout(&self) -> Result<(), DeckError> {
        let request = self
            .request(Method::POST, "/users/logout")
            .json(&serde_json::json!({}));
        self.execute::<serde_json::Value>(request).await?;
        self.set_access_token(None);
        Ok(())
    }

    pub async fn user_info(&self) -> Result<User, DeckError> {
        self.fetch(self.request(Method::GET, "/users/userInfo")).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    state: EditorState,
}

impl LoginForm {
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

    pub async fn submit(
        &mut self,
        client: &Client,
        notices: &mut dyn Notifier,
    ) -> Result<User, DeckError> {
        self.state.begin()?;

        let required = [
            ("Email", self.email.as_str()),
            ("Password", self.password.as_str()),
        ];
        let result = match require(&required) {
            Ok(()) => {
                let credentials = Credentials {
                    email: self.email.trim().to_string(),
                    password: self.password.clone(),
                };
                client.login(&credentials).await
            }
            Err(e) => Err(e),
        };

        let result = result.map(|user| {
            self.password.clear();
            user
        });
        if let Err(e) = &result {
            warn!("login failed: {}", e);
        }
        self.state.settle(result, notices, "Login successful!")
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    state: EditorState,
}

impl SignupForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    pub async fn submit(
        &mut self,
        client: &Client,
        notices: &mut dyn Notifier,
    ) -> Result<Option<User>, DeckError> {
        self.state.begin()?;

        let required = [
            ("Username", self.username.as_str()),
            ("Email", self.email.as_str()),
            ("Password", self.password.as_str()),
        ];
        let checked = require(&required).and_then(|()| {
            if self.password != self.confirm_password {
                Err(DeckError::Precondition("Passwords do not match".to_string()))
            } else {
                Ok(())
            }
        });

        let result = match checked {
            Ok(()) => {
                let registration = Registration {
                    username: self.username.trim().to_string(),
                    email: self.email.trim().to_string(),
                    password: self.password.clone(),
                };
                client.signup(&registration).await
            }
            Err(e) => Err(e),
        };

        let result = result.map(|user| {
            self.password.clear();
            self.confirm_password.clear();
            user
        });
        self.state.settle(result, notices, "Account created")
    }
}
