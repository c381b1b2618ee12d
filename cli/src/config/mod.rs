//! # Configuration
//!
//! Two kinds of configuration reach the core:
//!
//! 1. **Settings** (global CLI flags / environment variables)
//!    - Work path override (`--work-path`, `FLIGHT_WORK_PATH`)
//!    - API base URL override (`--api-url`, `FLIGHT_API_URL`)
//!
//! 2. **Manifest** (`flight.yml` in the current directory)
//!    - What to deploy and which environments exist
//!
//! Settings are resolved once at startup and passed to constructors; nothing
//! here is global state.

pub mod manifest;

pub use manifest::{FileManifestSource, ManifestSource};

use std::path::PathBuf;

/// Production API host
pub const DEFAULT_API_URL: &str = "https://api.getflight.io";

/// Version prefix appended to every API path
pub const API_VERSION: &str = "/v1";

/// Process-wide settings resolved from CLI flags
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Base directory holding `.flight/`; defaults to the home directory
    pub work_path: Option<PathBuf>,

    /// API host override
    pub api_url: Option<String>,

    /// Verbose logging requested
    pub verbose: bool,
}

impl Settings {
    /// API root including the version prefix
    pub fn api_base_url(&self) -> String {
        let host = self
            .api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL);
        format!("{}{}", host.trim_end_matches('/'), API_VERSION)
    }
}
