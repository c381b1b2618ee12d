//! Records owned by the flight API
//!
//! The server is the only authority on these; the CLI creates empty records
//! and observes how they change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::manifest::Manifest;
use super::wire;

/// Server-side upload unit for one build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    /// Pre-signed storage URL, populated asynchronously by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
}

impl Artifact {
    /// Upload URL once the server has prepared one
    pub fn upload_url(&self) -> Option<&str> {
        self.upload_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Lifecycle state shared by deployments and their steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum State {
    Initial,
    Executing,
    Completed,
    Failed,
    /// Any state this client does not know about
    Other(String),
}

impl State {
    /// The server may still change this record
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Initial | Self::Executing)
    }

    /// A step in this state has something worth reporting
    pub fn is_reportable(&self) -> bool {
        matches!(self, Self::Executing | Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initial => "initial",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::Initial
    }
}

/// States are compared exactly; any other spelling is `Other`
impl From<String> for State {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "initial" => Self::Initial,
            "executing" => Self::Executing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<State> for String {
    fn from(state: State) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rollout of one artifact into one environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub artifact: String,
    #[serde(default)]
    pub environment: String,
    /// Server-assigned sequence label shown to users as `#count`
    #[serde(default)]
    pub count: String,
    #[serde(default)]
    pub manifest: Manifest,
    #[serde(default, deserialize_with = "wire::list")]
    pub steps: Vec<DeploymentStep>,
}

/// Request body for a new deployment
#[derive(Debug, Clone, Serialize)]
pub struct NewDeployment<'a> {
    pub artifact: &'a str,
    pub environment: &'a str,
    pub manifest: &'a Manifest,
}

/// One unit of server-side provisioning work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStep {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, rename = "after_step_id")]
    pub before_step_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Organisation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "wire::list")]
    pub environments: Vec<Environment>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "wire::list")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "wire::list")]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub artifact: Option<Artifact>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "wire::list")]
    pub organisations: Vec<Organisation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub value: String,
}

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
