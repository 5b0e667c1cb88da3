//! Layer archive creation.
//!
//! Packs the staged source files into one uncompressed tar rooted at
//! `xregistry/`. Entries are appended in sorted path order with
//! normalized metadata (fixed mode, zero mtime/uid/gid) so an unchanged
//! source set always produces byte-identical archive content, and with
//! it an identical layer digest.

use std::fs::File;
use std::path::{Path, PathBuf};

use tar::{Builder, EntryType, Header};

use xregistry_oci_core::constants::LAYER_ROOT;
use xregistry_oci_core::{PackError, Result};

use crate::digest::{sha256_file, BlobRef};

/// File mode recorded for regular entries.
const FILE_MODE: u32 = 0o644;

/// File mode recorded for directory entries.
const DIR_MODE: u32 = 0o755;

/// Build the uncompressed layer tar from the staged files.
///
/// Writes the archive to `archive_path` and returns that path. The
/// staged file set is final by the time this runs; no filtering happens
/// here.
pub fn build_layer(staging_dir: &Path, archive_path: &Path) -> Result<PathBuf> {
    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PackError::LayerError(format!(
                "failed to create layer directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let file = File::create(archive_path).map_err(|e| {
        PackError::LayerError(format!(
            "failed to create layer archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    let mut builder = Builder::new(file);

    append_dir_entry(&mut builder, Path::new(LAYER_ROOT))?;

    let mut entries = Vec::new();
    collect_entries(staging_dir, staging_dir, &mut entries)?;
    entries.sort();

    for relative in &entries {
        let full_path = staging_dir.join(relative);
        let tar_path = Path::new(LAYER_ROOT).join(relative);
        if full_path.is_dir() {
            append_dir_entry(&mut builder, &tar_path)?;
        } else {
            append_file_entry(&mut builder, &tar_path, &full_path)?;
        }
        tracing::debug!(entry = %tar_path.display(), "Added layer entry");
    }

    builder.finish().map_err(|e| {
        PackError::LayerError(format!(
            "failed to finalize layer archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    Ok(archive_path.to_path_buf())
}

/// Compute the layer digest and size, writing the digest sidecar file.
///
/// The sidecar holds the unprefixed hex digest. Returns the layer's
/// [`BlobRef`] for the config and manifest stages.
pub fn digest_layer(archive_path: &Path, sha_path: &Path) -> Result<BlobRef> {
    if !archive_path.exists() {
        return Err(PackError::LayerError(format!(
            "layer archive not found: {}",
            archive_path.display()
        )));
    }

    let digest = sha256_file(archive_path)?;
    let size = std::fs::metadata(archive_path)
        .map_err(|e| {
            PackError::LayerError(format!(
                "failed to read layer archive metadata {}: {}",
                archive_path.display(),
                e
            ))
        })?
        .len();

    if let Some(parent) = sha_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PackError::LayerError(format!(
                "failed to create digest directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    std::fs::write(sha_path, digest.hex()).map_err(|e| {
        PackError::LayerError(format!(
            "failed to write layer digest {}: {}",
            sha_path.display(),
            e
        ))
    })?;

    tracing::info!(digest = %digest, size, "Layer archive digested");

    Ok(BlobRef { digest, size })
}

/// Recursively collect entry paths relative to `root`.
fn collect_entries(root: &Path, current: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(current).map_err(|e| {
        PackError::LayerError(format!(
            "failed to read staging directory {}: {}",
            current.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| PackError::LayerError(format!("failed to read staging entry: {}", e)))?;
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .map_err(|e| {
                PackError::LayerError(format!(
                    "failed to compute relative path for {}: {}",
                    path.display(),
                    e
                ))
            })?
            .to_path_buf();

        out.push(relative);
        if path.is_dir() {
            collect_entries(root, &path, out)?;
        }
    }

    Ok(())
}

fn append_dir_entry<W: std::io::Write>(builder: &mut Builder<W>, tar_path: &Path) -> Result<()> {
    let mut header = normalized_header(EntryType::Directory, DIR_MODE, 0);
    builder
        .append_data(&mut header, tar_path, std::io::empty())
        .map_err(|e| {
            PackError::LayerError(format!(
                "failed to add directory {} to layer: {}",
                tar_path.display(),
                e
            ))
        })
}

fn append_file_entry<W: std::io::Write>(
    builder: &mut Builder<W>,
    tar_path: &Path,
    file_path: &Path,
) -> Result<()> {
    let file = File::open(file_path).map_err(|e| {
        PackError::LayerError(format!(
            "failed to open staged file {}: {}",
            file_path.display(),
            e
        ))
    })?;
    let size = file
        .metadata()
        .map_err(|e| {
            PackError::LayerError(format!(
                "failed to read metadata for {}: {}",
                file_path.display(),
                e
            ))
        })?
        .len();

    let mut header = normalized_header(EntryType::Regular, FILE_MODE, size);
    builder
        .append_data(&mut header, tar_path, file)
        .map_err(|e| {
            PackError::LayerError(format!(
                "failed to add file {} to layer: {}",
                tar_path.display(),
                e
            ))
        })
}

/// Header with all run-varying fields pinned.
fn normalized_header(entry_type: EntryType, mode: u32, size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header
}
