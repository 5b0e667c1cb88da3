//! Layout verification.
//!
//! Walks a completed image layout from `index.json` down, recomputes
//! the SHA-256 of every referenced blob, and checks each descriptor's
//! digest and size against the stored bytes. Corruption surfaces as a
//! digest mismatch naming the blob and both digests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use xregistry_oci_core::constants::{OCI_BLOBS_SHA_DIR, OCI_INDEX_FILE};
use xregistry_oci_core::{PackError, Result};

use crate::config::ImageConfig;
use crate::digest::{sha256_file, Digest};
use crate::layout::ImageIndex;
use crate::manifest::ImageManifest;

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of blobs whose digests were recomputed and matched
    pub blobs_checked: usize,
}

/// Verify every digest and size reference in a layout directory.
pub fn verify_layout(layout_dir: &Path) -> Result<VerifyReport> {
    let index_path = layout_dir.join(OCI_INDEX_FILE);
    let index_bytes = std::fs::read(&index_path).map_err(|e| {
        PackError::LayoutError(format!("failed to read index {}: {}", index_path.display(), e))
    })?;
    let index: ImageIndex = serde_json::from_slice(&index_bytes)?;

    if index.manifests.is_empty() {
        return Err(PackError::LayoutError(format!(
            "index references no manifests: {}",
            index_path.display()
        )));
    }

    let blobs_dir = layout_dir.join(OCI_BLOBS_SHA_DIR);
    let mut referenced: HashSet<String> = HashSet::new();
    let mut blobs_checked = 0;

    for descriptor in &index.manifests {
        let manifest_digest = Digest::from_prefixed(&descriptor.digest)?;
        let manifest_path = check_blob(&blobs_dir, &manifest_digest, None)?;
        referenced.insert(manifest_digest.hex().to_string());
        blobs_checked += 1;

        let manifest_bytes = std::fs::read(&manifest_path).map_err(|e| {
            PackError::LayoutError(format!(
                "failed to read manifest blob {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        let manifest: ImageManifest = serde_json::from_slice(&manifest_bytes)?;

        let config_digest = Digest::from_prefixed(&manifest.config.digest)?;
        let config_path = check_blob(&blobs_dir, &config_digest, Some(manifest.config.size))?;
        referenced.insert(config_digest.hex().to_string());
        blobs_checked += 1;

        for layer in &manifest.layers {
            let layer_digest = Digest::from_prefixed(&layer.digest)?;
            check_blob(&blobs_dir, &layer_digest, Some(layer.size))?;
            referenced.insert(layer_digest.hex().to_string());
            blobs_checked += 1;
        }

        check_diff_ids(&config_path, &manifest)?;
    }

    check_for_orphans(&blobs_dir, &referenced)?;

    tracing::info!(
        layout = %layout_dir.display(),
        blobs = blobs_checked,
        "Layout verified"
    );

    Ok(VerifyReport { blobs_checked })
}

/// Recompute a stored blob's digest and check it against the reference.
fn check_blob(blobs_dir: &Path, digest: &Digest, expected_size: Option<u64>) -> Result<PathBuf> {
    let path = blobs_dir.join(digest.hex());
    if !path.exists() {
        return Err(PackError::LayoutError(format!(
            "blob store is missing {}",
            path.display()
        )));
    }

    let actual = sha256_file(&path)?;
    if actual != *digest {
        return Err(PackError::DigestMismatch {
            path: path.display().to_string(),
            expected: digest.prefixed(),
            actual: actual.prefixed(),
        });
    }

    if let Some(size) = expected_size {
        let file_size = std::fs::metadata(&path)
            .map_err(|e| {
                PackError::LayoutError(format!(
                    "failed to read blob metadata {}: {}",
                    path.display(),
                    e
                ))
            })?
            .len();
        if file_size != size {
            return Err(PackError::LayoutError(format!(
                "size mismatch for {}: descriptor says {}, file is {}",
                path.display(),
                size,
                file_size
            )));
        }
    }

    Ok(path)
}

/// The config's diff_ids must mirror the manifest's layer digests
/// (layers are uncompressed, so diff_id equals the layer blob digest).
fn check_diff_ids(config_path: &Path, manifest: &ImageManifest) -> Result<()> {
    let config_bytes = std::fs::read(config_path).map_err(|e| {
        PackError::LayoutError(format!(
            "failed to read config blob {}: {}",
            config_path.display(),
            e
        ))
    })?;
    let config: ImageConfig = serde_json::from_slice(&config_bytes)?;

    let layer_digests: Vec<&str> = manifest.layers.iter().map(|l| l.digest.as_str()).collect();
    if config.rootfs.diff_ids.len() != layer_digests.len() {
        return Err(PackError::LayoutError(format!(
            "config {} lists {} diff_ids but the manifest has {} layers",
            config_path.display(),
            config.rootfs.diff_ids.len(),
            layer_digests.len()
        )));
    }
    for (diff_id, layer_digest) in config.rootfs.diff_ids.iter().zip(layer_digests) {
        if diff_id != layer_digest {
            return Err(PackError::DigestMismatch {
                path: config_path.display().to_string(),
                expected: layer_digest.to_string(),
                actual: diff_id.clone(),
            });
        }
    }

    Ok(())
}

/// The blob store must contain exactly the referenced blobs.
fn check_for_orphans(blobs_dir: &Path, referenced: &HashSet<String>) -> Result<()> {
    let entries = std::fs::read_dir(blobs_dir).map_err(|e| {
        PackError::LayoutError(format!(
            "failed to read blob store {}: {}",
            blobs_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| PackError::LayoutError(format!("failed to read blob entry: {}", e)))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !referenced.contains(&name) {
            return Err(PackError::LayoutError(format!(
                "orphan blob in store: {}",
                entry.path().display()
            )));
        }
    }

    Ok(())
}
