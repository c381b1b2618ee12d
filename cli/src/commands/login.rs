use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::Term;

use crate::config::Settings;
use crate::infrastructure::{ApiClient, FileCredentialStore, WorkDir};
use crate::services::LoginService;
use crate::ui;

pub async fn execute(settings: &Settings, email: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password().context("Failed to read password")?,
    };

    let work_dir = WorkDir::resolve(settings.work_path.as_deref())?;
    let credentials = Arc::new(FileCredentialStore::new(work_dir));
    let gateway = Arc::new(
        ApiClient::new(settings, credentials.clone()).context("Failed to create API client")?,
    );

    let service = LoginService::new(gateway, credentials);
    let stdin = io::stdin();
    let organisation = service
        .login(&email, &password, &mut stdin.lock(), &mut io::stdout())
        .await?;

    ui::print_success(&format!("using organisation {}", organisation.name));
    Ok(())
}

/// Prompt for the password without echoing it
fn read_password() -> io::Result<String> {
    let term = Term::stderr();
    term.write_str("password: ")?;
    term.read_secure_line()
}
