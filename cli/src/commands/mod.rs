//! CLI command definitions and dispatch.

mod build;
mod verify;

use clap::{Parser, Subcommand};

/// xRegistry OCI packager — packages registry metadata as OCI images.
#[derive(Parser)]
#[command(name = "xregistry-oci", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Build an OCI image layout from an xRegistry source directory
    Build(build::BuildArgs),
    /// Verify the digests of a completed image layout
    Verify(verify::VerifyArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build(args) => build::execute(args),
        Command::Verify(args) => verify::execute(args),
    }
}
