//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services use infrastructure adapters to perform I/O operations.

pub mod deployment_service;
pub mod login_service;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use deployment_service::DeploymentService;
pub use login_service::LoginService;
