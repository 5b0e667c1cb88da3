//! xRegistry OCI Packager Core - Foundational Types
//!
//! This crate provides the types shared across the packager: the error
//! taxonomy, the build configuration, and the wire-format constants.

pub mod config;
pub mod constants;
pub mod error;

// Re-export commonly used types
pub use config::PackageConfig;
pub use error::{PackError, Result};

/// Packager version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
