//! Distribution packaging.
//!
//! Archives a completed image layout as a gzip-compressed tar named
//! `<name>-<version>.tar` in the distributions directory. The layout
//! contents are archived at the tarball root, so unpacking yields
//! `oci-layout`, `index.json`, and `blobs/` directly.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use xregistry_oci_core::{PackError, Result};

/// Package the layout directory into the distribution tarball.
///
/// Returns the path of the written archive.
pub fn package_distribution(
    layout_dir: &Path,
    distributions_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    if !layout_dir.is_dir() {
        return Err(PackError::PackagingError(format!(
            "layout directory not found: {}",
            layout_dir.display()
        )));
    }

    std::fs::create_dir_all(distributions_dir).map_err(|e| {
        PackError::PackagingError(format!(
            "failed to create distributions directory {}: {}",
            distributions_dir.display(),
            e
        ))
    })?;

    let archive_path = distributions_dir.join(file_name);
    let file = File::create(&archive_path).map_err(|e| {
        PackError::PackagingError(format!(
            "failed to create distribution archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    add_dir_to_tar(&mut builder, layout_dir, layout_dir)?;

    builder.finish().map_err(|e| {
        PackError::PackagingError(format!(
            "failed to finalize distribution archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    tracing::info!(archive = %archive_path.display(), "Distribution archive written");

    Ok(archive_path)
}

/// Recursively add a directory's contents to a tar builder, with paths
/// relative to `root`.
fn add_dir_to_tar<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    root: &Path,
    current: &Path,
) -> Result<()> {
    let entries = std::fs::read_dir(current).map_err(|e| {
        PackError::PackagingError(format!(
            "failed to read directory {}: {}",
            current.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| PackError::PackagingError(format!("failed to read entry: {}", e)))?;
        let path = entry.path();
        let relative = path.strip_prefix(root).map_err(|e| {
            PackError::PackagingError(format!("failed to strip prefix: {}", e))
        })?;

        if path.is_dir() {
            builder.append_dir(relative, &path).map_err(|e| {
                PackError::PackagingError(format!(
                    "failed to add directory {} to archive: {}",
                    relative.display(),
                    e
                ))
            })?;
            add_dir_to_tar(builder, root, &path)?;
        } else {
            builder
                .append_path_with_name(&path, relative)
                .map_err(|e| {
                    PackError::PackagingError(format!(
                        "failed to add file {} to archive: {}",
                        relative.display(),
                        e
                    ))
                })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_layout(dir: &Path) {
        fs::create_dir_all(dir.join("blobs/sha256")).unwrap();
        fs::write(dir.join("oci-layout"), r#"{"imageLayoutVersion":"1.0.0"}"#).unwrap();
        fs::write(dir.join("index.json"), r#"{"schemaVersion":2,"manifests":[]}"#).unwrap();
        fs::write(dir.join("blobs/sha256").join("a".repeat(64)), "blob").unwrap();
    }

    #[test]
    fn test_package_distribution_archives_layout() {
        let tmp = TempDir::new().unwrap();
        let layout = tmp.path().join("oci-layout");
        make_layout(&layout);
        let distributions = tmp.path().join("distributions");

        let archive =
            package_distribution(&layout, &distributions, "reg-1.0.0.tar").unwrap();

        assert_eq!(archive, distributions.join("reg-1.0.0.tar"));
        assert!(archive.exists());

        // The archive is gzip-compressed and holds the layout at its root
        let decoder = flate2::read::GzDecoder::new(File::open(&archive).unwrap());
        let mut tar = tar::Archive::new(decoder);
        let paths: Vec<String> = tar
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect();

        assert!(paths.iter().any(|p| p == "oci-layout"));
        assert!(paths.iter().any(|p| p == "index.json"));
        assert!(paths.iter().any(|p| p.starts_with("blobs/sha256/")));
    }

    #[test]
    fn test_package_missing_layout_fails() {
        let tmp = TempDir::new().unwrap();
        let err = package_distribution(
            &tmp.path().join("absent"),
            &tmp.path().join("distributions"),
            "x.tar",
        )
        .unwrap_err();
        assert!(matches!(err, PackError::PackagingError(_)));
        assert!(err.to_string().contains("layout directory not found"));
    }
}
