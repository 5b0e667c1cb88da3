//! `xregistry-oci build` command — package a source directory as an OCI image.
//!
//! Stages the eligible source files, runs the digest-chained pipeline,
//! and packages the resulting layout as a distribution tarball unless
//! `--no-package` is given.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;

use xregistry_oci_core::constants::{ARTIFACT_SUFFIX, XREGISTRY_SOURCE_DIR};
use xregistry_oci_core::PackageConfig;
use xregistry_oci_packager::{package_distribution, Pipeline};

#[derive(Args)]
pub struct BuildArgs {
    /// Directory containing the xRegistry source files
    #[arg(short, long, default_value = XREGISTRY_SOURCE_DIR)]
    pub source: String,

    /// Artifact name (default: "<current dir name>-xregistry")
    #[arg(short, long)]
    pub name: Option<String>,

    /// Artifact version
    #[arg(long = "artifact-version", default_value = "latest")]
    pub artifact_version: String,

    /// Build root directory for staging, blobs, layout, and distributions
    #[arg(long, default_value = "build")]
    pub build_root: String,

    /// Pin the config creation timestamp (RFC 3339) for reproducible builds
    #[arg(long)]
    pub created: Option<String>,

    /// Layer media type embedded in the manifest
    #[arg(long)]
    pub layer_media_type: Option<String>,

    /// Config media type embedded in the manifest
    #[arg(long)]
    pub config_media_type: Option<String>,

    /// Skip the distribution tarball
    #[arg(long)]
    pub no_package: bool,

    /// Print only the manifest digest
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn execute(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let artifact_name = match &args.name {
        Some(name) => name.clone(),
        None => default_artifact_name()?,
    };

    let created = args
        .created
        .as_deref()
        .map(parse_created)
        .transpose()?;

    let mut config = PackageConfig {
        source_dir: PathBuf::from(&args.source),
        build_root: PathBuf::from(&args.build_root),
        artifact_name,
        artifact_version: args.artifact_version.clone(),
        created,
        ..Default::default()
    };
    if let Some(media_type) = &args.layer_media_type {
        config.layer_media_type = media_type.clone();
    }
    if let Some(media_type) = &args.config_media_type {
        config.config_media_type = media_type.clone();
    }

    tracing::debug!(
        source = %config.source_dir.display(),
        build_root = %config.build_root.display(),
        reference = %config.reference_name(),
        "Resolved build configuration"
    );

    let outcome = Pipeline::new(config.clone()).run()?;

    if !args.no_package {
        let archive = package_distribution(
            &outcome.layout_dir,
            &config.distributions_dir(),
            &config.distribution_file_name(),
        )?;
        if !args.quiet {
            println!("Packaged {}", archive.display());
        }
    }

    if args.quiet {
        println!("{}", outcome.manifest.blob.digest);
    } else {
        println!(
            "Built {} ({} files, manifest {})",
            config.reference_name(),
            outcome.staged_files,
            outcome.manifest.blob.digest
        );
    }

    Ok(())
}

/// Parse an RFC 3339 timestamp into UTC.
fn parse_created(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid --created timestamp '{value}': {e}"))
}

/// Derive the artifact name from the current directory name.
fn default_artifact_name() -> Result<String, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to resolve current directory: {e}"))?;
    let dir_name = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| "Failed to derive artifact name from current directory".to_string())?;
    Ok(format!("{dir_name}{ARTIFACT_SUFFIX}"))
}
