//! Local work directory
//!
//! Everything flight keeps on disk lives under `<base>/.flight/`, where
//! `<base>` is the `--work-path` override or the user's home directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CredentialError;

const FLIGHT_DIR: &str = ".flight";
const BUILD_DIR: &str = "build";

#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Work directory rooted at `<base>/.flight`
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            root: base.as_ref().join(FLIGHT_DIR),
        }
    }

    /// Use the override when given, else the home directory
    pub fn resolve(work_path: Option<&Path>) -> Result<Self, CredentialError> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        debug!("default work path {:?}", home);
        debug!("provided work path {:?}", work_path);

        let base = match work_path {
            Some(path) => path.to_path_buf(),
            None => home.ok_or(CredentialError::NoHomeDirectory)?,
        };
        debug!("used work path {}", base.display());

        Ok(Self::new(base))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file stored directly under `.flight/`
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Directory holding packaged archives
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Create the build directory (and `.flight/` with it) if absent
    pub fn prepare(&self) -> std::io::Result<PathBuf> {
        let dir = self.build_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
