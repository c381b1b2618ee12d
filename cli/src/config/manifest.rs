//! Manifest file loading.
//!
//! Looks for `flight.yml` in the project directory. `flight.yaml`,
//! `flight.json` and `flight.toml` are accepted as well and parsed according
//! to their extension.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::Manifest;
use crate::error::ConfigError;

/// Candidate manifest file names, in lookup order
pub const MANIFEST_FILES: &[&str] = &["flight.yml", "flight.yaml", "flight.json", "flight.toml"];

/// Source of the deployment manifest
pub trait ManifestSource: Send + Sync {
    fn load(&self) -> Result<Manifest, ConfigError>;
}

/// Reads the manifest from a project directory
pub struct FileManifestSource {
    dir: PathBuf,
}

impl FileManifestSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Manifest source for the current working directory
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    fn find(&self) -> Option<PathBuf> {
        MANIFEST_FILES
            .iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.is_file())
    }
}

impl ManifestSource for FileManifestSource {
    fn load(&self) -> Result<Manifest, ConfigError> {
        info!("reading configuration");

        let path = self.find().ok_or_else(|| ConfigError::FileNotFound {
            dir: self.dir.display().to_string(),
        })?;
        debug!("using manifest {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        parse(&path, &content)
    }
}

/// Parse manifest content according to the file extension
pub fn parse(path: &Path, content: &str) -> Result<Manifest, ConfigError> {
    let parse_error = |message: String| ConfigError::ParseError {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Some("toml") => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
        _ => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}
