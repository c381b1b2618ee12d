//! flight API client
//!
//! HTTP implementation of [`RemoteGateway`] on top of reqwest.
//!
//! Every authenticated request carries:
//! - `Accept: application/json`
//! - `Authorization: Bearer <token>`
//! - `x-flight-organisation-id: <id>` when an organisation is on record
//!
//! Non-2xx responses are turned into [`ApiError::Status`] using the `message`
//! field of the JSON body when it parses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::credentials::CredentialStore;
use super::gateway::RemoteGateway;
use crate::config::Settings;
use crate::domain::remote::{
    Artifact, Deployment, Environment, ErrorBody, Login, NewDeployment, Organisation, Token, User,
};
use crate::error::ApiError;

/// Header naming the organisation a request acts for
pub const ORGANISATION_HEADER: &str = "x-flight-organisation-id";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deployment creation provisions infrastructure synchronously on the server
const DEPLOYMENT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Total time allowed for sending the archive body
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(settings: &Settings, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let base_url = settings.api_base_url();
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the JSON accept header and the stored credentials
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.credentials.token()?.unwrap_or_default();
        let mut request = request.header(ACCEPT, "application/json").bearer_auth(token);

        if let Some(organisation) = self.credentials.organisation() {
            request = request.header(ORGANISATION_HEADER, organisation);
        }

        Ok(request)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let request = self.authorized(self.client.get(&url))?;
        self.send(request, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let mut request = self.authorized(self.client.post(&url))?.json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        self.send(request, &url).await
    }

    /// Bare PUT to a pre-signed storage URL: no API headers, long timeout
    fn upload_request(&self, upload_url: &str, content: Vec<u8>) -> RequestBuilder {
        self.client
            .put(upload_url)
            .timeout(UPLOAD_TIMEOUT)
            .body(content)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;
        debug!("{} {}", response.status(), url);

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl RemoteGateway for ApiClient {
    async fn create_artifact(&self) -> Result<Artifact, ApiError> {
        self.post("/artifacts", &Artifact::default(), None).await
    }

    async fn get_artifact(&self, artifact_id: &str) -> Result<Artifact, ApiError> {
        self.get(&format!("/artifacts/{}", artifact_id)).await
    }

    async fn upload_artifact(&self, upload_url: &str, content: Vec<u8>) -> Result<(), ApiError> {
        debug!("PUT {} ({} bytes)", upload_url, content.len());

        let response = self
            .upload_request(upload_url, content)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: upload_url.to_string(),
                source,
            })?;

        check_status(response).await.map(|_| ())
    }

    async fn create_deployment(
        &self,
        deployment: &NewDeployment<'_>,
    ) -> Result<Deployment, ApiError> {
        self.post("/deployments", deployment, Some(DEPLOYMENT_TIMEOUT))
            .await
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, ApiError> {
        self.get(&format!("/deployments/{}", deployment_id)).await
    }

    async fn login(&self, login: &Login) -> Result<Token, ApiError> {
        let url = self.url("/auth/login");
        debug!("POST {}", url);

        let request = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(login);
        self.send(request, &url).await
    }

    async fn get_user(&self) -> Result<User, ApiError> {
        self.get("/me").await
    }

    async fn get_organisation(&self, organisation_id: &str) -> Result<Organisation, ApiError> {
        self.get(&format!("/organisations/{}", organisation_id))
            .await
    }

    async fn get_environment(&self, environment_id: &str) -> Result<Environment, ApiError> {
        self.get(&format!("/environments/{}", environment_id)).await
    }
}

/// Pass 2xx responses through, turn anything else into an [`ApiError`]
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    debug!("API error {} {}", status.as_u16(), response.url());
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

/// Build the error for a non-2xx response body
pub fn error_from_body(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|error| error.message)
        .unwrap_or_else(|_| format!("API error http code {}", status));

    ApiError::Status { status, message }
}
