//! Centralized error types for flight
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::progress::Stage;

/// Top-level error type for a deploy run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("token not found, login to deploy")]
    NotAuthenticated,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("{stage} failed: {source}")]
    Remote {
        stage: Stage,
        #[source]
        source: ApiError,
    },

    #[error("artifact failed to prepare for upload: {artifact_id}")]
    ArtifactNotReady { artifact_id: String, attempts: u32 },

    #[error("no organisation on record, login again to select one")]
    OrganisationNotSelected,

    #[error("environment not found in organisation: {0}")]
    EnvironmentNotInOrganisation(String),

    #[error("project not found in organisation: {0}")]
    ProjectNotInOrganisation(String),
}

impl DeployError {
    /// Wrap a gateway failure with the stage it happened in
    pub fn remote(stage: Stage) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::Remote { stage, source }
    }
}

/// A single broken manifest constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the field, e.g. `environments[0].databases[1].driver`
    pub field: String,
    pub rule: Rule,
}

/// Constraint a manifest field can break
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    MaxLength(usize),
    OneOf(&'static [&'static str]),
    NotEmpty,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::MaxLength(max) => write!(f, "must be at most {} characters", max),
            Self::OneOf(allowed) => write!(f, "must be one of: {}", allowed.join(", ")),
            Self::NotEmpty => write!(f, "must contain at least one entry"),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.rule)
    }
}

/// Manifest validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid manifest: {}", join_violations(.0))]
    Invalid(Vec<Violation>),

    #[error("environment {0} not found in flight.yml, please configure environment before deploying")]
    EnvironmentNotFound(String),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Artifact packaging errors
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("name in manifest cannot be empty")]
    MissingName,

    #[error("failed to prepare work directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error while writing bootstrap: {0}")]
    Bootstrap(#[source] ArchiveError),

    #[error("error while writing executable: {0}")]
    Executable(#[source] ArchiveError),

    #[error("error while writing includes: {0}")]
    Includes(#[source] ArchiveError),

    #[error("error while finalizing archive: {0}")]
    Finish(#[source] ArchiveError),

    #[error("failed to read packaged archive {path}: {source}")]
    ReadBack {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Low-level archive write failures, wrapped by a [`PackageError`] phase
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// Remote API errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response; message comes from the body when it parses
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Credential store errors
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("could not determine home directory, pass --work-path")]
    NoHomeDirectory,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: flight.yml (searched {dir})")]
    FileNotFound { dir: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Login errors
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("you need to be part of an organisation to login")]
    NoOrganisation,

    #[error("no valid organisation selected after {0} attempts")]
    TooManyAttempts(u32),

    #[error("no organisation selected, input closed")]
    InputClosed,

    #[error("failed to read input: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("{stage} failed: {source}")]
    Remote {
        stage: &'static str,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}
