use std::io;

use anyhow::{Context, Result};

use super::deploy;
use crate::config::Settings;
use crate::ui;

pub async fn execute(settings: &Settings, environment: String, project: String) -> Result<()> {
    let service = deploy::service(settings)?;

    let project = service
        .resolve_project(&environment, &project)
        .await
        .with_context(|| format!("Failed to look up project {} in {}", project, environment))?;

    ui::project_details(&mut io::stdout(), &project)?;
    Ok(())
}
