use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::{FileManifestSource, Settings};
use crate::infrastructure::{ApiClient, FileCredentialStore, Packager, WorkDir};
use crate::services::DeploymentService;

pub async fn execute(settings: &Settings, environment: String) -> Result<()> {
    let service = service(settings)?;

    let report = service.deploy(&environment).await?;
    debug!("{} steps reported", report.reported_steps.len());
    if !report.outcome.is_success() {
        anyhow::bail!(
            "deployment #{} to {} did not complete",
            report.deployment.count,
            environment
        );
    }

    Ok(())
}

/// Deployment service over the real work directory and API
pub(crate) fn service(settings: &Settings) -> Result<DeploymentService> {
    let work_dir = WorkDir::resolve(settings.work_path.as_deref())?;
    debug!("work directory {}", work_dir.root().display());

    let credentials = Arc::new(FileCredentialStore::new(work_dir.clone()));
    let gateway = Arc::new(
        ApiClient::new(settings, credentials.clone()).context("Failed to create API client")?,
    );

    Ok(DeploymentService::new(
        gateway,
        credentials,
        Box::new(FileManifestSource::current_dir()),
        Packager::new(work_dir),
    ))
}
