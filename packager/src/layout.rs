//! OCI image layout assembly.
//!
//! Materializes the terminal artifact: the `oci-layout` marker, the
//! digest-keyed blob store, and `index.json`. Every step overwrites
//! rather than appends, so a retried build converges to the same layout.
//! The index is written last: it only exists once the blob store it
//! references is complete.

use std::path::Path;

use serde::{Deserialize, Serialize};

use xregistry_oci_core::constants::{
    IMAGE_LAYOUT_VERSION, MANIFEST_MEDIA_TYPE, OCI_BLOBS_SHA_DIR, OCI_INDEX_FILE, OCI_LAYOUT_FILE,
};
use xregistry_oci_core::{PackError, Result};

use crate::pipeline::StageArtifact;

const SCHEMA_VERSION: u32 = 2;

/// Content of the `oci-layout` marker file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OciLayoutMarker {
    #[serde(rename = "imageLayoutVersion")]
    pub image_layout_version: String,
}

/// Annotations on the index's manifest descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexAnnotations {
    #[serde(rename = "org.opencontainers.image.ref.name")]
    pub ref_name: String,
}

/// Manifest descriptor inside the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub digest: String,
    pub annotations: IndexAnnotations,
}

/// Top-level image index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageIndex {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub manifests: Vec<IndexDescriptor>,
}

/// Assemble the image layout from the three written blobs.
///
/// `reference` is the registry reference name (`<name>:<version>`)
/// recorded in the index annotations.
pub fn assemble_layout(
    layout_dir: &Path,
    reference: &str,
    layer: &StageArtifact,
    config: &StageArtifact,
    manifest: &StageArtifact,
) -> Result<()> {
    std::fs::create_dir_all(layout_dir).map_err(|e| {
        PackError::LayoutError(format!(
            "failed to create layout directory {}: {}",
            layout_dir.display(),
            e
        ))
    })?;

    write_layout_marker(layout_dir)?;
    copy_blobs(layout_dir, [layer, config, manifest])?;
    write_index(layout_dir, reference, manifest)?;

    tracing::info!(
        layout = %layout_dir.display(),
        manifest = %manifest.blob.digest,
        reference,
        "OCI image layout assembled"
    );

    Ok(())
}

fn write_layout_marker(layout_dir: &Path) -> Result<()> {
    let marker = OciLayoutMarker {
        image_layout_version: IMAGE_LAYOUT_VERSION.to_string(),
    };
    let path = layout_dir.join(OCI_LAYOUT_FILE);
    std::fs::write(&path, serde_json::to_vec(&marker)?).map_err(|e| {
        PackError::LayoutError(format!(
            "failed to write layout marker {}: {}",
            path.display(),
            e
        ))
    })
}

fn copy_blobs(layout_dir: &Path, blobs: [&StageArtifact; 3]) -> Result<()> {
    let blobs_dir = layout_dir.join(OCI_BLOBS_SHA_DIR);

    // The store must hold exactly the referenced blobs; drop anything a
    // previous build left behind
    if blobs_dir.exists() {
        std::fs::remove_dir_all(&blobs_dir).map_err(|e| {
            PackError::LayoutError(format!(
                "failed to clear blob store {}: {}",
                blobs_dir.display(),
                e
            ))
        })?;
    }

    std::fs::create_dir_all(&blobs_dir).map_err(|e| {
        PackError::LayoutError(format!(
            "failed to create blob store {}: {}",
            blobs_dir.display(),
            e
        ))
    })?;

    for artifact in blobs {
        let target = blobs_dir.join(artifact.blob.digest.hex());
        std::fs::copy(&artifact.path, &target).map_err(|e| {
            PackError::LayoutError(format!(
                "failed to copy blob {} to {}: {}",
                artifact.path.display(),
                target.display(),
                e
            ))
        })?;
        tracing::debug!(blob = %target.display(), "Copied blob into store");
    }

    Ok(())
}

fn write_index(layout_dir: &Path, reference: &str, manifest: &StageArtifact) -> Result<()> {
    let index = ImageIndex {
        schema_version: SCHEMA_VERSION,
        manifests: vec![IndexDescriptor {
            media_type: MANIFEST_MEDIA_TYPE.to_string(),
            digest: manifest.blob.digest.prefixed(),
            annotations: IndexAnnotations {
                ref_name: reference.to_string(),
            },
        }],
    };

    let path = layout_dir.join(OCI_INDEX_FILE);
    std::fs::write(&path, serde_json::to_vec(&index)?).map_err(|e| {
        PackError::LayoutError(format!("failed to write index {}: {}", path.display(), e))
    })
}
