//! In-memory adapters for service tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ManifestSource;
use crate::domain::remote::{
    Artifact, Deployment, Environment, Login, NewDeployment, Organisation, Token, User,
};
use crate::domain::Manifest;
use crate::error::{ApiError, ConfigError, CredentialError};
use crate::infrastructure::{CredentialStore, RemoteGateway};

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} not found", what),
    }
}

/// Gateway answering from scripted responses and recording every call
#[derive(Default)]
pub struct StubGateway {
    artifacts: Mutex<VecDeque<Artifact>>,
    deployments: Mutex<VecDeque<Deployment>>,
    last_deployment: Mutex<Option<Deployment>>,
    upload_status: Option<u16>,
    login_status: Option<u16>,
    user: User,
    organisations: HashMap<String, Organisation>,
    environments: HashMap<String, Environment>,
    calls: Mutex<Vec<&'static str>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    created: Mutex<Vec<(String, String)>>,
    logins: Mutex<Vec<(String, String)>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_artifact() -> Artifact {
        Artifact {
            id: "artifact-1".to_string(),
            ..Default::default()
        }
    }

    pub fn ready_artifact() -> Artifact {
        Artifact {
            id: "artifact-1".to_string(),
            upload_url: Some("https://storage.test/upload".to_string()),
            ..Default::default()
        }
    }

    /// Responses for successive `get_artifact` calls; pending once exhausted
    pub fn with_artifacts(self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts.lock().unwrap().extend(artifacts);
        self
    }

    /// Responses for successive `get_deployment` calls; the last one repeats
    pub fn with_deployments(self, deployments: Vec<Deployment>) -> Self {
        self.deployments.lock().unwrap().extend(deployments);
        self
    }

    pub fn with_upload_status(mut self, status: u16) -> Self {
        self.upload_status = Some(status);
        self
    }

    pub fn with_login_status(mut self, status: u16) -> Self {
        self.login_status = Some(status);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = user;
        self
    }

    pub fn with_organisation(mut self, organisation: Organisation) -> Self {
        self.organisations
            .insert(organisation.id.clone(), organisation);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environments
            .insert(environment.id.clone(), environment);
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(upload_url, content)` per upload
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    /// `(artifact, environment)` per created deployment
    pub fn created_deployments(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    /// `(email, password)` per login
    pub fn logins(&self) -> Vec<(String, String)> {
        self.logins.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteGateway for StubGateway {
    async fn create_artifact(&self) -> Result<Artifact, ApiError> {
        self.record("create_artifact");
        Ok(Self::pending_artifact())
    }

    async fn get_artifact(&self, _artifact_id: &str) -> Result<Artifact, ApiError> {
        self.record("get_artifact");
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::pending_artifact))
    }

    async fn upload_artifact(&self, upload_url: &str, content: Vec<u8>) -> Result<(), ApiError> {
        self.record("upload_artifact");
        if let Some(status) = self.upload_status {
            return Err(ApiError::Status {
                status,
                message: format!("API error http code {}", status),
            });
        }
        self.uploads
            .lock()
            .unwrap()
            .push((upload_url.to_string(), content));
        Ok(())
    }

    async fn create_deployment(
        &self,
        deployment: &NewDeployment<'_>,
    ) -> Result<Deployment, ApiError> {
        self.record("create_deployment");
        self.created.lock().unwrap().push((
            deployment.artifact.to_string(),
            deployment.environment.to_string(),
        ));
        Ok(Deployment {
            id: "deployment-1".to_string(),
            artifact: deployment.artifact.to_string(),
            environment: deployment.environment.to_string(),
            count: "12".to_string(),
            manifest: deployment.manifest.clone(),
            ..Default::default()
        })
    }

    async fn get_deployment(&self, _deployment_id: &str) -> Result<Deployment, ApiError> {
        self.record("get_deployment");
        let next = self.deployments.lock().unwrap().pop_front();
        let mut last = self.last_deployment.lock().unwrap();
        if let Some(deployment) = next {
            *last = Some(deployment);
        }
        last.clone().ok_or_else(|| not_found("deployment"))
    }

    async fn login(&self, login: &Login) -> Result<Token, ApiError> {
        self.record("login");
        self.logins
            .lock()
            .unwrap()
            .push((login.email.clone(), login.password.clone()));
        match self.login_status {
            Some(status) => Err(ApiError::Status {
                status,
                message: "invalid credentials".to_string(),
            }),
            None => Ok(Token {
                value: "token-1".to_string(),
            }),
        }
    }

    async fn get_user(&self) -> Result<User, ApiError> {
        self.record("get_user");
        Ok(self.user.clone())
    }

    async fn get_organisation(&self, organisation_id: &str) -> Result<Organisation, ApiError> {
        self.record("get_organisation");
        self.organisations
            .get(organisation_id)
            .cloned()
            .ok_or_else(|| not_found("organisation"))
    }

    async fn get_environment(&self, environment_id: &str) -> Result<Environment, ApiError> {
        self.record("get_environment");
        self.environments
            .get(environment_id)
            .cloned()
            .ok_or_else(|| not_found("environment"))
    }
}

/// Credential store held in memory
#[derive(Default)]
pub struct MemoryCredentials {
    token: Mutex<Option<String>>,
    organisation: Mutex<Option<String>>,
}

impl MemoryCredentials {
    pub fn logged_in() -> Self {
        let credentials = Self::default();
        *credentials.token.lock().unwrap() = Some("token-0".to_string());
        credentials
    }

    pub fn with_organisation(self, organisation_id: &str) -> Self {
        *self.organisation.lock().unwrap() = Some(organisation_id.to_string());
        self
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn save_token(&self, token: &str) -> Result<(), CredentialError> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn organisation(&self) -> Option<String> {
        self.organisation.lock().unwrap().clone()
    }

    fn save_organisation(&self, organisation_id: &str) -> Result<(), CredentialError> {
        *self.organisation.lock().unwrap() = Some(organisation_id.to_string());
        Ok(())
    }
}

/// Manifest source returning a fixed manifest, or "not found" for `None`
pub struct StaticManifest(pub Option<Manifest>);

impl ManifestSource for StaticManifest {
    fn load(&self) -> Result<Manifest, ConfigError> {
        self.0.clone().ok_or_else(|| ConfigError::FileNotFound {
            dir: ".".to_string(),
        })
    }
}
