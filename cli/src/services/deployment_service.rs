//! Deployment service - orchestrates a deploy run
//!
//! Walks through every stage of a deploy strictly in order:
//! token check, manifest, validation, packaging, artifact creation,
//! artifact polling, upload, deployment creation, deployment polling.
//! Any failure aborts the run with the stage it happened in attached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::ManifestSource;
use crate::domain::progress::{Outcome, Stage, StepTracker};
use crate::domain::remote::{Artifact, Deployment, NewDeployment, Project};
use crate::domain::validation;
use crate::domain::Manifest;
use crate::error::DeployError;
use crate::infrastructure::{CredentialStore, PackagedArtifact, Packager, RemoteGateway};

/// Timing of the two polling loops
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Pause between polls (and before the first artifact poll)
    pub interval: Duration,
    /// Artifact readiness polls before giving up
    pub artifact_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            artifact_attempts: 20,
        }
    }
}

/// What a finished deploy run observed
#[derive(Debug)]
pub struct DeploymentReport {
    pub deployment: Deployment,
    pub outcome: Outcome,
    /// Step descriptions in the order they were reported
    pub reported_steps: Vec<String>,
}

/// Service for deploying the current project
pub struct DeploymentService {
    gateway: Arc<dyn RemoteGateway>,
    credentials: Arc<dyn CredentialStore>,
    manifests: Box<dyn ManifestSource>,
    packager: Packager,
    poll: PollPolicy,
}

impl DeploymentService {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        credentials: Arc<dyn CredentialStore>,
        manifests: Box<dyn ManifestSource>,
        packager: Packager,
    ) -> Self {
        Self {
            gateway,
            credentials,
            manifests,
            packager,
            poll: PollPolicy::default(),
        }
    }

    /// Builder: override polling timing
    #[cfg(test)]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Deploy the current project to `environment` and wait for the outcome
    pub async fn deploy(&self, environment: &str) -> Result<DeploymentReport, DeployError> {
        let start = Instant::now();

        self.verify_token()?;
        info!("deploying to {}", environment);

        let manifest = self.parse_manifest()?;
        self.validate_manifest(&manifest, environment)?;
        let package = self.package_artifact(&manifest)?;

        let artifact = self.create_artifact().await?;
        let artifact = self.poll_artifact_for_upload(artifact).await?;
        self.upload_artifact(&artifact, package.content).await?;

        let deployment = self
            .create_deployment(&artifact, environment, &manifest)
            .await?;
        let (deployment, reported_steps) = self.poll_deployment(deployment).await?;

        let outcome = Outcome::from_deployment(&deployment, start.elapsed());
        reached(Stage::Terminal);
        info!("{}", outcome);

        Ok(DeploymentReport {
            deployment,
            outcome,
            reported_steps,
        })
    }

    fn verify_token(&self) -> Result<(), DeployError> {
        if !self.credentials.has_token() {
            return Err(DeployError::NotAuthenticated);
        }
        reached(Stage::TokenVerified);
        Ok(())
    }

    fn parse_manifest(&self) -> Result<Manifest, DeployError> {
        info!("parsing manifest");
        let manifest = self.manifests.load()?;
        reached(Stage::ManifestParsed);
        Ok(manifest)
    }

    fn validate_manifest(&self, manifest: &Manifest, environment: &str) -> Result<(), DeployError> {
        validation::validate(manifest, environment)?;
        reached(Stage::Validated);
        Ok(())
    }

    fn package_artifact(&self, manifest: &Manifest) -> Result<PackagedArtifact, DeployError> {
        info!("packaging artifact");
        let package = self.packager.package(manifest)?;
        debug!(
            "artifact {} sha256 {}",
            package.path.display(),
            package.sha256
        );
        reached(Stage::Packaged);
        Ok(package)
    }

    async fn create_artifact(&self) -> Result<Artifact, DeployError> {
        info!("saving artifact");
        let artifact = self
            .gateway
            .create_artifact()
            .await
            .map_err(DeployError::remote(Stage::ArtifactCreated))?;
        debug!("created artifact {}", artifact.id);
        reached(Stage::ArtifactCreated);
        Ok(artifact)
    }

    /// Wait for the server to attach an upload URL to the artifact
    async fn poll_artifact_for_upload(&self, artifact: Artifact) -> Result<Artifact, DeployError> {
        info!("polling artifact for upload");
        sleep(self.poll.interval).await;

        let attempts = self.poll.artifact_attempts;
        for attempt in 1..=attempts {
            let current = self
                .gateway
                .get_artifact(&artifact.id)
                .await
                .map_err(DeployError::remote(Stage::ArtifactReady))?;

            if current.upload_url().is_some() {
                reached(Stage::ArtifactReady);
                return Ok(current);
            }

            debug!(
                "artifact preparing for upload pending, retry attempt: {} for artifact: {}",
                attempt, artifact.id
            );
            if attempt < attempts {
                sleep(self.poll.interval).await;
            }
        }

        Err(DeployError::ArtifactNotReady {
            artifact_id: artifact.id,
            attempts,
        })
    }

    async fn upload_artifact(&self, artifact: &Artifact, content: Vec<u8>) -> Result<(), DeployError> {
        info!("uploading artifact");
        let upload_url = artifact
            .upload_url()
            .ok_or_else(|| DeployError::ArtifactNotReady {
                artifact_id: artifact.id.clone(),
                attempts: 0,
            })?;

        self.gateway
            .upload_artifact(upload_url, content)
            .await
            .map_err(DeployError::remote(Stage::Uploaded))?;
        reached(Stage::Uploaded);
        Ok(())
    }

    async fn create_deployment(
        &self,
        artifact: &Artifact,
        environment: &str,
        manifest: &Manifest,
    ) -> Result<Deployment, DeployError> {
        info!("initiating deployment");
        let request = NewDeployment {
            artifact: &artifact.id,
            environment,
            manifest,
        };

        let deployment = self
            .gateway
            .create_deployment(&request)
            .await
            .map_err(DeployError::remote(Stage::DeploymentCreated))?;
        debug!("created deployment {} (#{})", deployment.id, deployment.count);
        reached(Stage::DeploymentCreated);
        Ok(deployment)
    }

    /// Poll the deployment until it leaves `initial`/`executing`.
    ///
    /// Unbounded, unlike artifact polling.
    async fn poll_deployment(
        &self,
        deployment: Deployment,
    ) -> Result<(Deployment, Vec<String>), DeployError> {
        reached(Stage::Polling);
        let mut tracker = StepTracker::new();
        let mut reported = Vec::new();

        loop {
            let current = self
                .gateway
                .get_deployment(&deployment.id)
                .await
                .map_err(DeployError::remote(Stage::Polling))?;

            for description in tracker.observe(&current.steps) {
                info!("{}", description);
                reported.push(description.to_string());
            }

            if !current.state.is_pending() {
                return Ok((current, reported));
            }

            debug!("deployment {} is {}", current.id, current.state);
            sleep(self.poll.interval).await;
        }
    }

    /// Find a project by environment and project name in the stored
    /// organisation. Names match case-insensitively.
    pub async fn resolve_project(
        &self,
        environment_name: &str,
        project_name: &str,
    ) -> Result<Project, DeployError> {
        let organisation_id = self
            .credentials
            .organisation()
            .ok_or(DeployError::OrganisationNotSelected)?;

        let organisation = self
            .gateway
            .get_organisation(&organisation_id)
            .await
            .map_err(DeployError::remote(Stage::ProjectResolution))?;

        let environment = organisation
            .environments
            .iter()
            .find(|env| env.name.eq_ignore_ascii_case(environment_name))
            .ok_or_else(|| DeployError::EnvironmentNotInOrganisation(environment_name.to_string()))?;

        let environment = self
            .gateway
            .get_environment(&environment.id)
            .await
            .map_err(DeployError::remote(Stage::ProjectResolution))?;

        environment
            .projects
            .into_iter()
            .find(|project| project.name.eq_ignore_ascii_case(project_name))
            .ok_or_else(|| DeployError::ProjectNotInOrganisation(project_name.to_string()))
    }
}

fn reached(stage: Stage) {
    debug!(stage = ?stage, "stage reached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::remote::{DeploymentStep, Environment, Organisation, State};
    use crate::domain::manifest::ManifestEnvironment;
    use crate::error::{ApiError, ConfigError, ValidationError};
    use crate::infrastructure::WorkDir;
    use crate::services::testing::{MemoryCredentials, StaticManifest, StubGateway};

    struct Fixture {
        _work: tempfile::TempDir,
        _source: tempfile::TempDir,
        gateway: Arc<StubGateway>,
        service: DeploymentService,
    }

    fn manifest() -> Manifest {
        Manifest {
            name: "app".to_string(),
            files: None,
            trigger: "queue".to_string(),
            environments: vec![ManifestEnvironment {
                name: "dev".to_string(),
                ..Default::default()
            }],
        }
    }

    fn fixture_with(
        gateway: StubGateway,
        credentials: MemoryCredentials,
        manifest: Option<Manifest>,
    ) -> Fixture {
        let work = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("app"), b"binary").unwrap();

        let gateway = Arc::new(gateway);
        let packager = Packager::with_source_root(WorkDir::new(work.path()), source.path());
        let service = DeploymentService::new(
            gateway.clone(),
            Arc::new(credentials),
            Box::new(StaticManifest(manifest)),
            packager,
        )
        .with_poll_policy(PollPolicy {
            interval: Duration::ZERO,
            artifact_attempts: 20,
        });

        Fixture {
            _work: work,
            _source: source,
            gateway,
            service,
        }
    }

    fn fixture(gateway: StubGateway) -> Fixture {
        fixture_with(gateway, MemoryCredentials::logged_in(), Some(manifest()))
    }

    fn deployment(state: State, steps: Vec<DeploymentStep>) -> Deployment {
        Deployment {
            id: "deployment-1".to_string(),
            state,
            count: "12".to_string(),
            steps,
            ..Default::default()
        }
    }

    fn step(id: &str, name: &str, state: State) -> DeploymentStep {
        DeploymentStep {
            id: id.to_string(),
            name: name.to_string(),
            state,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_deploy_happy_path() {
        let gateway = StubGateway::new()
            .with_artifacts(vec![StubGateway::ready_artifact()])
            .with_deployments(vec![deployment(State::Completed, vec![])]);
        let fx = fixture(gateway);

        let report = tokio_test::assert_ok!(fx.service.deploy("dev").await);

        assert!(report.outcome.is_success());
        assert!(report.outcome.to_string().starts_with("deployment #12 completed"));
        assert_eq!(fx.gateway.calls("create_artifact"), 1);
        assert_eq!(fx.gateway.calls("get_artifact"), 1);
        assert_eq!(fx.gateway.calls("upload_artifact"), 1);
        assert_eq!(fx.gateway.calls("create_deployment"), 1);
        assert_eq!(fx.gateway.calls("get_deployment"), 1);

        let uploads = fx.gateway.uploads();
        assert_eq!(uploads[0].0, "https://storage.test/upload");
        assert!(uploads[0].1.starts_with(b"PK"));

        let created = fx.gateway.created_deployments();
        assert_eq!(created, vec![("artifact-1".to_string(), "dev".to_string())]);
    }

    #[tokio::test]
    async fn test_deploy_without_token_makes_no_calls() {
        let fx = fixture_with(
            StubGateway::new(),
            MemoryCredentials::default(),
            Some(manifest()),
        );

        let err = fx.service.deploy("dev").await.unwrap_err();
        assert!(matches!(err, DeployError::NotAuthenticated));
        assert_eq!(fx.gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_deploy_propagates_manifest_errors() {
        let fx = fixture_with(StubGateway::new(), MemoryCredentials::logged_in(), None);

        let err = fx.service.deploy("dev").await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deploy_rejects_unknown_environment_before_network() {
        let fx = fixture(StubGateway::new());

        let err = fx.service.deploy("prod").await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Validation(ValidationError::EnvironmentNotFound(_))
        ));
        assert_eq!(fx.gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_artifact_polling_stops_at_first_ready_response() {
        let pending = StubGateway::pending_artifact();
        let gateway = StubGateway::new()
            .with_artifacts(vec![
                pending.clone(),
                pending.clone(),
                pending,
                StubGateway::ready_artifact(),
            ])
            .with_deployments(vec![deployment(State::Completed, vec![])]);
        let fx = fixture(gateway);

        tokio_test::assert_ok!(fx.service.deploy("dev").await);
        assert_eq!(fx.gateway.calls("get_artifact"), 4);
    }

    #[tokio::test]
    async fn test_artifact_polling_gives_up_after_twenty_attempts() {
        let gateway = StubGateway::new().with_artifacts(vec![StubGateway::pending_artifact(); 25]);
        let fx = fixture(gateway);

        let err = fx.service.deploy("dev").await.unwrap_err();
        match err {
            DeployError::ArtifactNotReady {
                ref artifact_id,
                attempts,
            } => {
                assert_eq!(artifact_id, "artifact-1");
                assert_eq!(attempts, 20);
            }
            other => panic!("expected ArtifactNotReady, got {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "artifact failed to prepare for upload: artifact-1"
        );
        assert_eq!(fx.gateway.calls("get_artifact"), 20);
        assert_eq!(fx.gateway.calls("upload_artifact"), 0);
    }

    #[tokio::test]
    async fn test_steps_are_reported_once() {
        let gateway = StubGateway::new()
            .with_artifacts(vec![StubGateway::ready_artifact()])
            .with_deployments(vec![
                deployment(State::Initial, vec![]),
                deployment(
                    State::Executing,
                    vec![step("s1", "ensure_artifact_exists", State::Executing)],
                ),
                deployment(
                    State::Executing,
                    vec![
                        step("s1", "ensure_artifact_exists", State::Completed),
                        step("s2", "deploy_artifact", State::Executing),
                    ],
                ),
                deployment(
                    State::Completed,
                    vec![
                        step("s1", "ensure_artifact_exists", State::Completed),
                        step("s2", "deploy_artifact", State::Completed),
                    ],
                ),
            ]);
        let fx = fixture(gateway);

        let report = fx.service.deploy("dev").await.unwrap();
        assert_eq!(
            report.reported_steps,
            vec!["ensuring artifact exists", "deploying artifact"]
        );
        assert_eq!(fx.gateway.calls("get_deployment"), 4);
    }

    #[tokio::test]
    async fn test_failed_deployment_reports_failed_step() {
        let mut failed = step("s2", "create_database", State::Failed);
        failed.result = Some("quota exceeded".to_string());

        let gateway = StubGateway::new()
            .with_artifacts(vec![StubGateway::ready_artifact()])
            .with_deployments(vec![deployment(
                State::Failed,
                vec![step("s1", "ensure_artifact_exists", State::Completed), failed],
            )]);
        let fx = fixture(gateway);

        let report = fx.service.deploy("dev").await.unwrap();
        assert!(!report.outcome.is_success());
        assert_eq!(
            report.outcome.to_string(),
            "deployment #12 failed on step create_database with error quota exceeded"
        );
    }

    #[tokio::test]
    async fn test_states_are_matched_exactly() {
        let gateway = StubGateway::new()
            .with_artifacts(vec![StubGateway::ready_artifact()])
            .with_deployments(vec![deployment(State::from("COMPLETED".to_string()), vec![])]);
        let fx = fixture(gateway);

        let report = fx.service.deploy("dev").await.unwrap();
        assert!(!report.outcome.is_success());
        assert_eq!(report.outcome.to_string(), "deployment #12 failed");
        assert_eq!(fx.gateway.calls("get_deployment"), 1);
    }

    #[tokio::test]
    async fn test_deployment_without_steps_keeps_polling() {
        let fresh: Deployment =
            serde_json::from_str(r#"{"id":"deployment-1","state":"initial","count":"12","steps":null}"#)
                .unwrap();
        let gateway = StubGateway::new()
            .with_artifacts(vec![StubGateway::ready_artifact()])
            .with_deployments(vec![fresh, deployment(State::Completed, vec![])]);
        let fx = fixture(gateway);

        let report = fx.service.deploy("dev").await.unwrap();
        assert!(report.outcome.is_success());
        assert!(report.reported_steps.is_empty());
        assert_eq!(fx.gateway.calls("get_deployment"), 2);
    }

    #[tokio::test]
    async fn test_upload_failure_is_wrapped_with_stage() {
        let gateway = StubGateway::new()
            .with_artifacts(vec![StubGateway::ready_artifact()])
            .with_upload_status(403);
        let fx = fixture(gateway);

        let err = fx.service.deploy("dev").await.unwrap_err();
        match err {
            DeployError::Remote { stage, ref source } => {
                assert_eq!(stage, Stage::Uploaded);
                assert!(matches!(source, ApiError::Status { status: 403, .. }));
            }
            other => panic!("expected Remote error, got {:?}", other),
        }
        assert_eq!(fx.gateway.calls("create_deployment"), 0);
    }

    fn organisation() -> Organisation {
        Organisation {
            id: "org-1".to_string(),
            name: "acme".to_string(),
            environments: vec![Environment {
                id: "env-1".to_string(),
                name: "Staging".to_string(),
                ..Default::default()
            }],
        }
    }

    fn staging() -> Environment {
        Environment {
            id: "env-1".to_string(),
            name: "Staging".to_string(),
            projects: vec![Project {
                id: "project-1".to_string(),
                name: "Orders".to_string(),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_resolve_project_matches_case_insensitively() {
        let gateway = StubGateway::new()
            .with_organisation(organisation())
            .with_environment(staging());
        let fx = fixture_with(
            gateway,
            MemoryCredentials::logged_in().with_organisation("org-1"),
            Some(manifest()),
        );

        let project = fx.service.resolve_project("staging", "orders").await.unwrap();
        assert_eq!(project.id, "project-1");
    }

    #[tokio::test]
    async fn test_resolve_project_missing_environment() {
        let gateway = StubGateway::new().with_organisation(organisation());
        let fx = fixture_with(
            gateway,
            MemoryCredentials::logged_in().with_organisation("org-1"),
            Some(manifest()),
        );

        let err = fx.service.resolve_project("prod", "orders").await.unwrap_err();
        assert!(matches!(err, DeployError::EnvironmentNotInOrganisation(ref env) if env == "prod"));
        assert_eq!(fx.gateway.calls("get_environment"), 0);
    }

    #[tokio::test]
    async fn test_resolve_project_missing_project() {
        let gateway = StubGateway::new()
            .with_organisation(organisation())
            .with_environment(staging());
        let fx = fixture_with(
            gateway,
            MemoryCredentials::logged_in().with_organisation("org-1"),
            Some(manifest()),
        );

        let err = fx.service.resolve_project("staging", "billing").await.unwrap_err();
        assert!(matches!(err, DeployError::ProjectNotInOrganisation(ref p) if p == "billing"));
    }

    #[tokio::test]
    async fn test_resolve_project_without_organisation() {
        let fx = fixture(StubGateway::new());

        let err = fx.service.resolve_project("staging", "orders").await.unwrap_err();
        assert!(matches!(err, DeployError::OrganisationNotSelected));
        assert_eq!(fx.gateway.total_calls(), 0);
    }
}
