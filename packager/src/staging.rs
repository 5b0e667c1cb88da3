//! Source staging.
//!
//! Copies eligible registry metadata files (`.json`, `.yaml`, `.yml`)
//! from the configured source directory into the staging directory,
//! preserving relative paths. The layer builder consumes the staged set
//! as-is; all filtering happens here, before the pipeline starts.

use std::path::{Path, PathBuf};

use xregistry_oci_core::constants::ARTIFACT_EXTENSIONS;
use xregistry_oci_core::{PackError, Result};

/// Stage eligible source files into `staging_dir`.
///
/// Returns the number of files staged. Fails if the source directory is
/// missing, is not a directory, or contains no eligible files.
pub fn stage_sources(source_dir: &Path, staging_dir: &Path) -> Result<usize> {
    if !source_dir.exists() {
        return Err(PackError::InvalidSource(format!(
            "xRegistry source directory does not exist: {}",
            source_dir.display()
        )));
    }
    if !source_dir.is_dir() {
        return Err(PackError::InvalidSource(format!(
            "xRegistry source path is not a directory: {}",
            source_dir.display()
        )));
    }

    let mut files = Vec::new();
    collect_eligible(source_dir, source_dir, &mut files)?;

    if files.is_empty() {
        return Err(PackError::InvalidSource(format!(
            "no xRegistry files found in directory: {}",
            source_dir.display()
        )));
    }

    // The staging set is replaced wholesale; stale files from a previous
    // build must not leak into the layer
    if staging_dir.exists() {
        std::fs::remove_dir_all(staging_dir).map_err(|e| {
            PackError::InvalidSource(format!(
                "failed to clear staging directory {}: {}",
                staging_dir.display(),
                e
            ))
        })?;
    }

    // Deterministic copy order
    files.sort();

    for relative in &files {
        let from = source_dir.join(relative);
        let to = staging_dir.join(relative);
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PackError::InvalidSource(format!(
                    "failed to create staging directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        std::fs::copy(&from, &to).map_err(|e| {
            PackError::InvalidSource(format!(
                "failed to stage {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;
        tracing::debug!(file = %relative.display(), "Staged xRegistry file");
    }

    tracing::info!(
        count = files.len(),
        source = %source_dir.display(),
        staging = %staging_dir.display(),
        "Staged xRegistry source files"
    );

    Ok(files.len())
}

/// Recursively collect eligible files, as paths relative to `root`.
fn collect_eligible(root: &Path, current: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(current).map_err(|e| {
        PackError::InvalidSource(format!(
            "failed to read directory {}: {}",
            current.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            PackError::InvalidSource(format!("failed to read directory entry: {}", e))
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_eligible(root, &path, out)?;
        } else if is_eligible(&path) {
            let relative = path.strip_prefix(root).map_err(|e| {
                PackError::InvalidSource(format!(
                    "failed to compute relative path for {}: {}",
                    path.display(),
                    e
                ))
            })?;
            out.push(relative.to_path_buf());
        }
    }

    Ok(())
}

/// A file is eligible when its extension is in the artifact extension set.
fn is_eligible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ARTIFACT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_stage_filters_by_extension() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let staging = tmp.path().join("staging");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("schema.json"), "{}").unwrap();
        fs::write(source.join("policy.yaml"), "a: 1").unwrap();
        fs::write(source.join("rules.yml"), "b: 2").unwrap();
        fs::write(source.join("README.md"), "ignored").unwrap();
        fs::write(source.join("notes.txt"), "ignored").unwrap();

        let count = stage_sources(&source, &staging).unwrap();

        assert_eq!(count, 3);
        assert!(staging.join("schema.json").exists());
        assert!(staging.join("policy.yaml").exists());
        assert!(staging.join("rules.yml").exists());
        assert!(!staging.join("README.md").exists());
        assert!(!staging.join("notes.txt").exists());
    }

    #[test]
    fn test_stage_preserves_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let staging = tmp.path().join("staging");
        fs::create_dir_all(source.join("policies/eu")).unwrap();
        fs::write(source.join("policies/eu/gdpr.json"), "{}").unwrap();
        fs::write(source.join("top.yaml"), "x: 1").unwrap();

        let count = stage_sources(&source, &staging).unwrap();

        assert_eq!(count, 2);
        assert!(staging.join("policies/eu/gdpr.json").exists());
        assert!(staging.join("top.yaml").exists());
    }

    #[test]
    fn test_stage_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let err = stage_sources(&tmp.path().join("absent"), &tmp.path().join("staging"))
            .unwrap_err();
        assert!(matches!(err, PackError::InvalidSource(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_stage_source_not_a_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.json");
        fs::write(&file, "{}").unwrap();
        let err = stage_sources(&file, &tmp.path().join("staging")).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_stage_empty_source_fails() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("README.md"), "no registry files").unwrap();

        let err = stage_sources(&source, &tmp.path().join("staging")).unwrap_err();
        assert!(matches!(err, PackError::InvalidSource(_)));
        assert!(err.to_string().contains("no xRegistry files found"));
    }
}
