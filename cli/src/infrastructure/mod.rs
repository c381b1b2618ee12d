//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - The flight API (HTTP)
//! - Credential files under the work directory
//! - Artifact archives on the local filesystem

pub mod api_client;
pub mod credentials;
pub mod gateway;
pub mod packager;
pub mod workdir;

// Re-export commonly used types
pub use api_client::ApiClient;
pub use credentials::{CredentialStore, FileCredentialStore};
pub use gateway::RemoteGateway;
pub use packager::{PackagedArtifact, Packager};
pub use workdir::WorkDir;
