//! Image manifest blob.
//!
//! Ties the config and layer descriptors together with the artifact's
//! title/version annotations. `layers` stays a sequence even though this
//! builder only ever populates one entry.

use std::path::Path;

use serde::{Deserialize, Serialize};

use xregistry_oci_core::constants::{CONFIG_MEDIA_TYPE, LAYER_MEDIA_TYPE, MANIFEST_MEDIA_TYPE};
use xregistry_oci_core::{PackError, Result};

use crate::digest::{sha256_bytes, BlobRef};

const SCHEMA_VERSION: u32 = 2;

/// A content descriptor pointing at a blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub digest: String,
    pub size: u64,
}

/// Manifest annotations carrying the artifact identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestAnnotations {
    #[serde(rename = "org.opencontainers.image.title")]
    pub title: String,
    #[serde(rename = "org.opencontainers.image.version")]
    pub version: String,
}

/// OCI image manifest document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageManifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
    pub annotations: ManifestAnnotations,
}

/// Builds the manifest blob from the layer and config blob refs.
///
/// Both upstream refs must be supplied before [`ManifestBuilder::build`];
/// a missing ref is a pipeline ordering error naming the absent value.
#[derive(Debug)]
pub struct ManifestBuilder {
    artifact_name: String,
    artifact_version: String,
    layer_media_type: String,
    config_media_type: String,
    layer: Option<BlobRef>,
    config: Option<BlobRef>,
}

impl ManifestBuilder {
    pub fn new(artifact_name: &str, artifact_version: &str) -> Self {
        Self {
            artifact_name: artifact_name.to_string(),
            artifact_version: artifact_version.to_string(),
            layer_media_type: LAYER_MEDIA_TYPE.to_string(),
            config_media_type: CONFIG_MEDIA_TYPE.to_string(),
            layer: None,
            config: None,
        }
    }

    /// Override the layer media type (embedded verbatim).
    pub fn layer_media_type(mut self, media_type: &str) -> Self {
        self.layer_media_type = media_type.to_string();
        self
    }

    /// Override the config media type (embedded verbatim).
    pub fn config_media_type(mut self, media_type: &str) -> Self {
        self.config_media_type = media_type.to_string();
        self
    }

    /// Set the layer blob ref.
    pub fn layer(mut self, layer: BlobRef) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Set the config blob ref.
    pub fn config(mut self, config: BlobRef) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the manifest document.
    pub fn build(&self) -> Result<ImageManifest> {
        let layer = self.layer.as_ref().ok_or_else(|| {
            PackError::PipelineOrdering(
                "layer digest/size not set; the layer must be digested before the manifest is built"
                    .to_string(),
            )
        })?;
        let config = self.config.as_ref().ok_or_else(|| {
            PackError::PipelineOrdering(
                "config digest/size not set; the config must be built before the manifest"
                    .to_string(),
            )
        })?;

        Ok(ImageManifest {
            schema_version: SCHEMA_VERSION,
            media_type: MANIFEST_MEDIA_TYPE.to_string(),
            config: Descriptor {
                media_type: self.config_media_type.clone(),
                digest: config.digest.prefixed(),
                size: config.size,
            },
            layers: vec![Descriptor {
                media_type: self.layer_media_type.clone(),
                digest: layer.digest.prefixed(),
                size: layer.size,
            }],
            annotations: ManifestAnnotations {
                title: self.artifact_name.clone(),
                version: self.artifact_version.clone(),
            },
        })
    }

    /// Serialize the manifest, digest the exact bytes, then persist them.
    ///
    /// Returns the manifest blob's digest and size for layout assembly.
    pub fn write(&self, path: &Path) -> Result<BlobRef> {
        let manifest = self.build()?;
        let bytes = serde_json::to_vec(&manifest)?;
        let digest = sha256_bytes(&bytes);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_with_path(e, parent))?;
        }
        std::fs::write(path, &bytes).map_err(|e| io_with_path(e, path))?;

        tracing::info!(digest = %digest, size = bytes.len(), "Manifest blob written");

        Ok(BlobRef {
            digest,
            size: bytes.len() as u64,
        })
    }
}

fn io_with_path(e: std::io::Error, path: &Path) -> PackError {
    PackError::IoError(std::io::Error::new(
        e.kind(),
        format!("{}: {}", path.display(), e),
    ))
}
