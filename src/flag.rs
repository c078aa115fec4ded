// src/flag.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cache::Entity;

/// Deployment context a flag is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    Other(String),
}

impl Environment {
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Other(name) => name,
        }
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            _ => Environment::Other(value),
        }
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.as_str().to_string()
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from(s.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(
        default,
        deserialize_with = "deserialize_enabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Flag {
    /// A flag whose enabled state was never reported counts as disabled.
    pub fn enabled(&self) -> bool {
        self.is_enabled.unwrap_or(false)
    }
}

impl Entity for Flag {
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

    fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    fn merge(&mut self, update: Self) {
        if !update.name.is_empty() {
            self.name = update.name;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if update.environment.is_some() {
            self.environment = update.environment;
        }
        if update.is_enabled.is_some() {
            self.is_enabled = update.is_enabled;
        }
        if update.created_at.is_some() {
            self.created_at = update.created_at;
        }
        if update.updated_at.is_some() {
            self.updated_at = update.updated_at;
        }
    }
}

/// Body of `POST /flags/createFlag/:projectId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlag {
    pub name: String,
    pub description: String,
    pub environment: Environment,
    #[serde(serialize_with = "serialize_enabled")]
    pub is_enabled: bool,
}

/// Body of `PUT /flags/updateFlag`, minus the flag id which the collection adds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagPatch {
    pub name: String,
    pub description: String,
    pub environment: Environment,
    #[serde(serialize_with = "serialize_enabled")]
    pub is_enabled: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBool {
    Bool(bool),
    Text(String),
}

// The backend hands out both `true` and `"true"`; anything else reads as disabled.
fn deserialize_enabled<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<WireBool>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        WireBool::Bool(b) => b,
        WireBool::Text(s) => s == "true",
    }))
}

/// The single place the enabled state is turned into its wire form.
pub fn enabled_to_wire(enabled: bool) -> &'static str {
    if enabled {
        "true"
    } else {
        "false"
    }
}

fn serialize_enabled<S>(enabled: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(enabled_to_wire(*enabled))
}
