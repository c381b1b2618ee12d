//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod manifest;
pub mod progress;
pub mod remote;
pub mod validation;
pub mod wire;

// Re-export commonly used types
pub use manifest::Manifest;
