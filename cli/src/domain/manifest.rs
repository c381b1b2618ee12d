//! Manifest domain types
//!
//! The manifest is the user-authored `flight.yml` describing what to deploy
//! and where. It is loaded once per deploy and sent verbatim to the API as
//! part of the deployment record.

use serde::{Deserialize, Serialize};

use super::wire;

/// Triggers a deployed workload can be invoked by
pub const TRIGGERS: &[&str] = &["gateway", "queue"];

/// Database drivers the platform can provision
pub const DATABASE_DRIVERS: &[&str] = &["mysql", "postgresql"];

/// Declarative deployment descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Executable file name in the current directory
    #[serde(default)]
    pub name: String,

    /// Extra files or directories shipped next to the executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// `gateway` (HTTP) or `queue` (message)
    #[serde(default)]
    pub trigger: String,

    #[serde(default, deserialize_with = "wire::list")]
    pub environments: Vec<ManifestEnvironment>,
}

impl Manifest {
    pub fn environment(&self, name: &str) -> Option<&ManifestEnvironment> {
        self.environments.iter().find(|env| env.name == name)
    }

    pub fn includes(&self) -> &[String] {
        self.files.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEnvironment {
    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "wire::list")]
    pub databases: Vec<ManifestDatabase>,

    #[serde(default, deserialize_with = "wire::list")]
    pub variables: Vec<ManifestVariable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestDatabase {
    #[serde(default)]
    pub name: String,

    /// `mysql` or `postgresql`
    #[serde(default)]
    pub driver: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestVariable {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub value: String,
}
