//! Deploy progress domain types
//!
//! Defines the deploy run as a state machine with explicit stages, the
//! bookkeeping for reporting server-side steps, and the terminal outcome.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use super::remote::{Deployment, DeploymentStep, State};

/// Stages of a deploy run, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TokenVerified,
    ManifestParsed,
    Validated,
    Packaged,
    ArtifactCreated,
    ArtifactReady,
    Uploaded,
    DeploymentCreated,
    Polling,
    Terminal,
    /// Auxiliary organisation/environment/project lookup
    ProjectResolution,
}

impl Stage {
    /// Work performed to reach this stage
    pub fn action(&self) -> &'static str {
        match self {
            Self::TokenVerified => "token verification",
            Self::ManifestParsed => "manifest parsing",
            Self::Validated => "manifest validation",
            Self::Packaged => "artifact packaging",
            Self::ArtifactCreated => "artifact creation",
            Self::ArtifactReady => "artifact polling",
            Self::Uploaded => "artifact upload",
            Self::DeploymentCreated => "deployment creation",
            Self::Polling => "deployment polling",
            Self::Terminal => "reporting",
            Self::ProjectResolution => "project resolution",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// Human readable description of a server-side step
pub fn describe_step(name: &str) -> &str {
    match name {
        "ensure_artifact_exists" => "ensuring artifact exists",
        "ensure_environment_configured" => "ensuring environment is configured",
        "ensure_databases_exists" => "ensuring databases exists",
        "create_database" => "creating database",
        "deploy_artifact" => "deploying artifact",
        other => other,
    }
}

/// Remembers which steps were already reported during one polling run.
///
/// A step id is reported at most once, the first time it is seen in a
/// reportable state, even if its state changes afterwards.
#[derive(Debug, Default)]
pub struct StepTracker {
    reported: HashSet<String>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptions of steps not reported before, in the order observed
    pub fn observe<'a>(&mut self, steps: &'a [DeploymentStep]) -> Vec<&'a str> {
        steps
            .iter()
            .filter(|step| step.state.is_reportable())
            .filter(|step| self.reported.insert(step.id.clone()))
            .map(|step| describe_step(&step.name))
            .collect()
    }
}

/// How a deployment ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed {
        count: String,
        elapsed: Duration,
    },
    FailedAtStep {
        count: String,
        step: String,
        result: String,
    },
    Failed {
        count: String,
    },
}

impl Outcome {
    /// Derive the outcome of a deployment that is no longer pending
    pub fn from_deployment(deployment: &Deployment, elapsed: Duration) -> Self {
        let count = deployment.count.clone();

        if deployment.state == State::Completed {
            return Self::Completed { count, elapsed };
        }

        match deployment
            .steps
            .iter()
            .find(|step| step.state.as_str().eq_ignore_ascii_case("failed"))
        {
            Some(step) => Self::FailedAtStep {
                count,
                step: step.name.clone(),
                result: step.result.clone().unwrap_or_default(),
            },
            None => Self::Failed { count },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { count, elapsed } => {
                let rounded = Duration::from_secs(elapsed.as_secs_f64().round() as u64);
                write!(
                    f,
                    "deployment #{} completed successfully in {}",
                    count,
                    humantime::format_duration(rounded)
                )
            }
            Self::FailedAtStep {
                count,
                step,
                result,
            } => write!(
                f,
                "deployment #{} failed on step {} with error {}",
                count, step, result
            ),
            Self::Failed { count } => write!(f, "deployment #{} failed", count),
        }
    }
}
