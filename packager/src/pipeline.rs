//! Build pipeline coordinator.
//!
//! Runs the six stages in order, threading each stage's typed result
//! into the next stage's input:
//!
//! ```text
//! Staged → LayerBuilt → LayerDigested → ConfigBuilt → ManifestBuilt → LayoutAssembled
//! ```
//!
//! The chain is strictly sequential; a failing stage halts the build and
//! later stages never run. Outputs already on disk are left as-is: every
//! stage overwrites, so a retry from the top converges.

use std::fmt;
use std::path::PathBuf;

use xregistry_oci_core::{PackageConfig, Result};

use crate::config::ConfigBuilder;
use crate::digest::BlobRef;
use crate::layer::{build_layer, digest_layer};
use crate::layout::assemble_layout;
use crate::manifest::ManifestBuilder;
use crate::staging::stage_sources;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Staged,
    LayerBuilt,
    LayerDigested,
    ConfigBuilt,
    ManifestBuilt,
    LayoutAssembled,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Staged => "Staged",
            BuildStage::LayerBuilt => "LayerBuilt",
            BuildStage::LayerDigested => "LayerDigested",
            BuildStage::ConfigBuilt => "ConfigBuilt",
            BuildStage::ManifestBuilt => "ManifestBuilt",
            BuildStage::LayoutAssembled => "LayoutAssembled",
        };
        write!(f, "{name}")
    }
}

/// A stage's product: the blob file on disk plus its identity.
#[derive(Debug, Clone)]
pub struct StageArtifact {
    /// Path of the written blob file
    pub path: PathBuf,
    /// Digest and size of the blob bytes
    pub blob: BlobRef,
}

/// Result of a completed build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Number of source files staged into the layer
    pub staged_files: usize,
    /// Layer blob (tar archive)
    pub layer: StageArtifact,
    /// Config blob
    pub config: StageArtifact,
    /// Manifest blob
    pub manifest: StageArtifact,
    /// Assembled image layout directory
    pub layout_dir: PathBuf,
}

/// Sequences the build stages for one packaging invocation.
pub struct Pipeline {
    config: PackageConfig,
}

impl Pipeline {
    pub fn new(config: PackageConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline against the configured build root.
    pub fn run(&self) -> Result<BuildOutcome> {
        let cfg = &self.config;

        let staged_files = stage_sources(&cfg.source_dir, &cfg.staging_dir())?;
        tracing::info!(stage = %BuildStage::Staged, files = staged_files, "Stage complete");

        let archive_path = build_layer(&cfg.staging_dir(), &cfg.layer_archive_path())?;
        tracing::info!(stage = %BuildStage::LayerBuilt, archive = %archive_path.display(), "Stage complete");

        let layer_blob = digest_layer(&archive_path, &cfg.layer_sha_path())?;
        tracing::info!(stage = %BuildStage::LayerDigested, digest = %layer_blob.digest, "Stage complete");
        let layer = StageArtifact {
            path: archive_path,
            blob: layer_blob,
        };

        let mut config_builder = ConfigBuilder::new().layer_digest(layer.blob.digest.clone());
        if let Some(created) = cfg.created {
            config_builder = config_builder.created(created);
        }
        let config_blob = config_builder.write(&cfg.config_path())?;
        tracing::info!(stage = %BuildStage::ConfigBuilt, digest = %config_blob.digest, "Stage complete");
        let config = StageArtifact {
            path: cfg.config_path(),
            blob: config_blob,
        };

        let manifest_blob = ManifestBuilder::new(&cfg.artifact_name, &cfg.artifact_version)
            .layer_media_type(&cfg.layer_media_type)
            .config_media_type(&cfg.config_media_type)
            .layer(layer.blob.clone())
            .config(config.blob.clone())
            .write(&cfg.manifest_path())?;
        tracing::info!(stage = %BuildStage::ManifestBuilt, digest = %manifest_blob.digest, "Stage complete");
        let manifest = StageArtifact {
            path: cfg.manifest_path(),
            blob: manifest_blob,
        };

        let layout_dir = cfg.layout_dir();
        assemble_layout(&layout_dir, &cfg.reference_name(), &layer, &config, &manifest)?;
        tracing::info!(stage = %BuildStage::LayoutAssembled, layout = %layout_dir.display(), "Stage complete");

        Ok(BuildOutcome {
            staged_files,
            layer,
            config,
            manifest,
            layout_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::sha256_file;
    use crate::layout::ImageIndex;
    use crate::manifest::ImageManifest;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use xregistry_oci_core::PackError;

    fn test_config(root: &Path) -> PackageConfig {
        let source_dir = root.join("source");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("schema.json"), r#"{"type":"object"}"#).unwrap();

        PackageConfig {
            source_dir,
            build_root: root.join("build"),
            artifact_name: "test-xregistry".to_string(),
            artifact_version: "1.0.0".to_string(),
            created: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_build() {
        let tmp = TempDir::new().unwrap();
        let cfg = test_config(tmp.path());
        let outcome = Pipeline::new(cfg.clone()).run().unwrap();

        let layout = outcome.layout_dir;
        assert!(layout.join("oci-layout").exists());
        assert!(layout.join("index.json").exists());

        // Three blobs, each named by its own content digest
        let blobs_dir = layout.join("blobs/sha256");
        let mut blob_count = 0;
        for entry in fs::read_dir(&blobs_dir).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert_eq!(name.len(), 64);
            assert_eq!(sha256_file(&path).unwrap().hex(), name);
            blob_count += 1;
        }
        assert_eq!(blob_count, 3);

        // Index references the manifest blob and carries the ref name
        let index: ImageIndex =
            serde_json::from_slice(&fs::read(layout.join("index.json")).unwrap()).unwrap();
        assert_eq!(
            index.manifests[0].digest,
            outcome.manifest.blob.digest.prefixed()
        );
        assert_eq!(
            index.manifests[0].annotations.ref_name,
            "test-xregistry:1.0.0"
        );

        // Manifest references the stored config and layer blobs, with exact sizes
        let manifest_blob = blobs_dir.join(outcome.manifest.blob.digest.hex());
        let manifest: ImageManifest =
            serde_json::from_slice(&fs::read(&manifest_blob).unwrap()).unwrap();
        assert_eq!(manifest.config.digest, outcome.config.blob.digest.prefixed());
        assert_eq!(manifest.layers[0].digest, outcome.layer.blob.digest.prefixed());
        assert_eq!(
            manifest.config.size,
            fs::metadata(blobs_dir.join(outcome.config.blob.digest.hex()))
                .unwrap()
                .len()
        );
        assert_eq!(
            manifest.layers[0].size,
            fs::metadata(blobs_dir.join(outcome.layer.blob.digest.hex()))
                .unwrap()
                .len()
        );
    }

    #[test]
    fn test_rebuild_is_idempotent_with_pinned_timestamp() {
        let tmp = TempDir::new().unwrap();
        let cfg = test_config(tmp.path());

        let first = Pipeline::new(cfg.clone()).run().unwrap();
        let second = Pipeline::new(cfg).run().unwrap();

        assert_eq!(first.layer.blob, second.layer.blob);
        assert_eq!(first.config.blob, second.config.blob);
        assert_eq!(first.manifest.blob, second.manifest.blob);
    }

    #[test]
    fn test_layer_digest_stable_across_runs_without_pinned_timestamp() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = test_config(tmp.path());
        cfg.created = None;

        let first = Pipeline::new(cfg.clone()).run().unwrap();
        let second = Pipeline::new(cfg).run().unwrap();

        // The layer never depends on the wall clock
        assert_eq!(first.layer.blob, second.layer.blob);
    }

    #[test]
    fn test_rebuild_after_source_change_replaces_layout_wholesale() {
        let tmp = TempDir::new().unwrap();
        let cfg = test_config(tmp.path());

        let first = Pipeline::new(cfg.clone()).run().unwrap();

        // Change the source set and rebuild into the same build root
        fs::write(
            cfg.source_dir.join("schema.json"),
            r#"{"type":"object","required":["id"]}"#,
        )
        .unwrap();
        let second = Pipeline::new(cfg.clone()).run().unwrap();
        assert_ne!(first.layer.blob.digest, second.layer.blob.digest);

        // The blob store holds exactly the three new blobs, no orphans
        let blobs_dir = second.layout_dir.join("blobs/sha256");
        let names: Vec<String> = fs::read_dir(&blobs_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&second.layer.blob.digest.hex().to_string()));
        assert!(!names.contains(&first.layer.blob.digest.hex().to_string()));
    }

    #[test]
    fn test_empty_source_halts_before_any_blob() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = test_config(tmp.path());
        let empty = tmp.path().join("empty-source");
        fs::create_dir_all(&empty).unwrap();
        cfg.source_dir = empty;

        let err = Pipeline::new(cfg.clone()).run().unwrap_err();
        assert!(matches!(err, PackError::InvalidSource(_)));

        // The layer builder never ran
        assert!(!cfg.layers_dir().exists());
        assert!(!cfg.layout_dir().exists());
    }

    #[test]
    fn test_missing_source_halts_before_any_blob() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = test_config(tmp.path());
        cfg.source_dir = tmp.path().join("absent");

        let err = Pipeline::new(cfg.clone()).run().unwrap_err();
        assert!(matches!(err, PackError::InvalidSource(_)));
        assert!(!cfg.layout_dir().join("index.json").exists());
    }
}
