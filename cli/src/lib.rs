//! xRegistry OCI packager CLI - packages registry metadata as OCI images.

pub mod commands;
