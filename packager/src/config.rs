//! Image config blob.
//!
//! The config document describes the platform and references the layer
//! digest through `rootfs.diff_ids`. Field order is fixed by struct
//! declaration order; the digest is computed over the serialized bytes
//! before they are persisted, so it can never observe a partial write.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use xregistry_oci_core::constants::{CREATED_BY, LAYER_COMMENT};
use xregistry_oci_core::{PackError, Result};

use crate::digest::{sha256_bytes, BlobRef, Digest};

const ARCHITECTURE: &str = "amd64";
const OS: &str = "linux";
const ROOTFS_TYPE: &str = "layers";

/// OCI image config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub architecture: String,
    pub os: String,
    /// Runtime config, reserved; always serialized as `{}`
    pub config: RuntimeConfig,
    pub rootfs: RootFs,
    pub history: Vec<HistoryEntry>,
}

/// Reserved runtime configuration (empty object on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {}

/// Root filesystem section referencing the layer digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootFs {
    #[serde(rename = "type")]
    pub fs_type: String,
    pub diff_ids: Vec<String>,
}

/// Single provenance entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub created: String,
    pub created_by: String,
    pub comment: String,
}

/// Builds the config blob from the layer digest.
///
/// The layer digest must be supplied before [`ConfigBuilder::build`];
/// a missing digest is a pipeline ordering error, distinct from any
/// write failure.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    layer_digest: Option<Digest>,
    created: Option<DateTime<Utc>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layer digest this config references.
    pub fn layer_digest(mut self, digest: Digest) -> Self {
        self.layer_digest = Some(digest);
        self
    }

    /// Pin the creation timestamp; wall clock is used when unset.
    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Build the config document.
    pub fn build(&self) -> Result<ImageConfig> {
        let layer_digest = self.layer_digest.as_ref().ok_or_else(|| {
            PackError::PipelineOrdering(
                "layer digest not set; the layer must be digested before the config is built"
                    .to_string(),
            )
        })?;

        let created = self.created.unwrap_or_else(Utc::now);

        Ok(ImageConfig {
            architecture: ARCHITECTURE.to_string(),
            os: OS.to_string(),
            config: RuntimeConfig::default(),
            rootfs: RootFs {
                fs_type: ROOTFS_TYPE.to_string(),
                diff_ids: vec![layer_digest.prefixed()],
            },
            history: vec![HistoryEntry {
                created: created.to_rfc3339(),
                created_by: CREATED_BY.to_string(),
                comment: LAYER_COMMENT.to_string(),
            }],
        })
    }

    /// Serialize the config, digest the exact bytes, then persist them.
    ///
    /// Returns the config blob's digest and size for the manifest stage.
    pub fn write(&self, path: &Path) -> Result<BlobRef> {
        let config = self.build()?;
        let bytes = serde_json::to_vec(&config)?;
        let digest = sha256_bytes(&bytes);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_with_path(e, parent))?;
        }
        std::fs::write(path, &bytes).map_err(|e| io_with_path(e, path))?;

        tracing::info!(digest = %digest, size = bytes.len(), "Config blob written");

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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn layer_digest() -> Digest {
        sha256_bytes(b"layer bytes")
    }

    #[test]
    fn test_build_without_layer_digest_is_ordering_error() {
        let err = ConfigBuilder::new().build().unwrap_err();
        assert!(matches!(err, PackError::PipelineOrdering(_)));
        assert!(err.to_string().contains("layer digest"));
    }

    #[test]
    fn test_build_references_layer_digest() {
        let digest = layer_digest();
        let config = ConfigBuilder::new()
            .layer_digest(digest.clone())
            .build()
            .unwrap();

        assert_eq!(config.architecture, "amd64");
        assert_eq!(config.os, "linux");
        assert_eq!(config.rootfs.fs_type, "layers");
        assert_eq!(config.rootfs.diff_ids, vec![digest.prefixed()]);
        assert_eq!(config.history.len(), 1);
        assert_eq!(config.history[0].created_by, "xregistry-oci-packager");
    }

    #[test]
    fn test_serialized_field_order() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let config = ConfigBuilder::new()
            .layer_digest(layer_digest())
            .created(created)
            .build()
            .unwrap();
        let json = String::from_utf8(serde_json::to_vec(&config).unwrap()).unwrap();

        assert!(json.starts_with(r#"{"architecture":"amd64","os":"linux","config":{},"rootfs":{"type":"layers","diff_ids":["#));
        assert!(json.contains(r#""history":[{"created":"2025-03-01T12:00:00+00:00","created_by":"xregistry-oci-packager","comment":"xRegistry policy layer"}]"#));
    }

    #[test]
    fn test_pinned_timestamp_is_deterministic() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let builder = || {
            ConfigBuilder::new()
                .layer_digest(layer_digest())
                .created(created)
        };
        let first = serde_json::to_vec(&builder().build().unwrap()).unwrap();
        let second = serde_json::to_vec(&builder().build().unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_returns_digest_of_written_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("oci-config/config.json");

        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let blob = ConfigBuilder::new()
            .layer_digest(layer_digest())
            .created(created)
            .write(&path)
            .unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(blob.digest, sha256_bytes(&written));
        assert_eq!(blob.size, written.len() as u64);
    }
}
