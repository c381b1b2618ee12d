//! Remote gateway abstraction
//!
//! The small set of calls the deploy and login workflows make against the
//! flight API. [`ApiClient`](super::api_client::ApiClient) is the HTTP
//! implementation; tests substitute a scripted stub.

use async_trait::async_trait;

use crate::domain::remote::{
    Artifact, Deployment, Environment, Login, NewDeployment, Organisation, Token, User,
};
use crate::error::ApiError;

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Request a new, empty artifact record
    async fn create_artifact(&self) -> Result<Artifact, ApiError>;

    async fn get_artifact(&self, artifact_id: &str) -> Result<Artifact, ApiError>;

    /// Upload archive bytes to the artifact's pre-signed storage URL
    async fn upload_artifact(&self, upload_url: &str, content: Vec<u8>) -> Result<(), ApiError>;

    async fn create_deployment(&self, deployment: &NewDeployment<'_>)
        -> Result<Deployment, ApiError>;

    async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, ApiError>;

    async fn login(&self, login: &Login) -> Result<Token, ApiError>;

    /// The authenticated user
    async fn get_user(&self) -> Result<User, ApiError>;

    async fn get_organisation(&self, organisation_id: &str) -> Result<Organisation, ApiError>;

    async fn get_environment(&self, environment_id: &str) -> Result<Environment, ApiError>;
}
