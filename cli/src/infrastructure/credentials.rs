//! Credential persistence
//!
//! The API token and the selected organisation id are plain files under the
//! work directory (`.flight/token`, `.flight/organisation`).

use std::io::ErrorKind;

use tracing::debug;

use super::workdir::WorkDir;
use crate::error::CredentialError;

const TOKEN_FILE: &str = "token";
const ORGANISATION_FILE: &str = "organisation";

/// Storage for the API token and organisation id
pub trait CredentialStore: Send + Sync {
    /// Stored token, `None` when the user never logged in
    fn token(&self) -> Result<Option<String>, CredentialError>;

    fn save_token(&self, token: &str) -> Result<(), CredentialError>;

    /// Stored organisation id.
    ///
    /// Read failures degrade to `None`; the organisation is optional context.
    fn organisation(&self) -> Option<String>;

    fn save_organisation(&self, organisation_id: &str) -> Result<(), CredentialError>;

    fn has_token(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                debug!("{:?}", e);
                false
            }
        }
    }
}

/// Credential store backed by files in the work directory
pub struct FileCredentialStore {
    work_dir: WorkDir,
}

impl FileCredentialStore {
    pub fn new(work_dir: WorkDir) -> Self {
        Self { work_dir }
    }

    fn read(&self, name: &str) -> Result<Option<String>, CredentialError> {
        let path = self.work_dir.file(name);
        debug!("reading from {}", path.display());

        match std::fs::read_to_string(&path) {
            Ok(value) => {
                let value = value.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialError::Read { path, source }),
        }
    }

    fn write(&self, name: &str, value: &str) -> Result<(), CredentialError> {
        let path = self.work_dir.file(name);
        self.work_dir
            .prepare()
            .map_err(|source| CredentialError::Write {
                path: self.work_dir.build_dir(),
                source,
            })?;

        debug!("writing to {}", path.display());
        std::fs::write(&path, value).map_err(|source| CredentialError::Write { path, source })
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Result<Option<String>, CredentialError> {
        self.read(TOKEN_FILE)
    }

    fn save_token(&self, token: &str) -> Result<(), CredentialError> {
        self.write(TOKEN_FILE, token)
    }

    fn organisation(&self) -> Option<String> {
        self.read(ORGANISATION_FILE).unwrap_or_else(|e| {
            debug!("{:?}", e);
            None
        })
    }

    fn save_organisation(&self, organisation_id: &str) -> Result<(), CredentialError> {
        self.write(ORGANISATION_FILE, organisation_id)
    }
}
