use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    CONFIG_MEDIA_TYPE, DISTRIBUTIONS_DIR, LAYER_MEDIA_TYPE, OCI_CONFIG_DIR, OCI_CONFIG_FILE,
    OCI_LAYERS_DIR, OCI_LAYOUT_DIR, OCI_MANIFEST_DIR, OCI_MANIFEST_FILE, XREGISTRY_LAYER_ARCHIVE,
    XREGISTRY_LAYER_SHA, XREGISTRY_SOURCE_DIR, XREGISTRY_STAGING_DIR,
};

/// Build configuration for one packaging invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Directory containing the xRegistry source files
    pub source_dir: PathBuf,

    /// Scratch directory for staging, intermediate blobs, layout, and distributions
    pub build_root: PathBuf,

    /// Artifact name used in annotations and the distribution file name
    pub artifact_name: String,

    /// Artifact version used in annotations and the distribution file name
    pub artifact_version: String,

    /// Media type of the layer blob
    pub layer_media_type: String,

    /// Media type of the config blob
    pub config_media_type: String,

    /// Creation timestamp recorded in the config history; wall clock when unset
    pub created: Option<DateTime<Utc>>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(XREGISTRY_SOURCE_DIR),
            build_root: PathBuf::from("build"),
            artifact_name: "xregistry".to_string(),
            artifact_version: "latest".to_string(),
            layer_media_type: LAYER_MEDIA_TYPE.to_string(),
            config_media_type: CONFIG_MEDIA_TYPE.to_string(),
            created: None,
        }
    }
}

impl PackageConfig {
    /// Staging directory holding the filtered source files
    pub fn staging_dir(&self) -> PathBuf {
        self.build_root.join(XREGISTRY_STAGING_DIR)
    }

    /// Directory holding the layer archive and its digest sidecar
    pub fn layers_dir(&self) -> PathBuf {
        self.build_root.join(OCI_LAYERS_DIR)
    }

    /// Path of the layer tar archive
    pub fn layer_archive_path(&self) -> PathBuf {
        self.layers_dir().join(XREGISTRY_LAYER_ARCHIVE)
    }

    /// Path of the layer digest sidecar
    pub fn layer_sha_path(&self) -> PathBuf {
        self.layers_dir().join(XREGISTRY_LAYER_SHA)
    }

    /// Path of the config blob
    pub fn config_path(&self) -> PathBuf {
        self.build_root.join(OCI_CONFIG_DIR).join(OCI_CONFIG_FILE)
    }

    /// Path of the manifest blob
    pub fn manifest_path(&self) -> PathBuf {
        self.build_root
            .join(OCI_MANIFEST_DIR)
            .join(OCI_MANIFEST_FILE)
    }

    /// Directory receiving the assembled image layout
    pub fn layout_dir(&self) -> PathBuf {
        self.build_root.join(OCI_LAYOUT_DIR)
    }

    /// Directory receiving the distribution tarball
    pub fn distributions_dir(&self) -> PathBuf {
        self.build_root.join(DISTRIBUTIONS_DIR)
    }

    /// Registry reference name, `<name>:<version>`
    pub fn reference_name(&self) -> String {
        format!("{}:{}", self.artifact_name, self.artifact_version)
    }

    /// Distribution tarball file name, `<name>-<version>.tar`
    pub fn distribution_file_name(&self) -> String {
        format!("{}-{}.tar", self.artifact_name, self.artifact_version)
    }
}
