//! Wire-format and build-layout constants.
//!
//! Media types and file names are fixed by the OCI Image Format
//! Specification and by the xRegistry distribution conventions; the
//! intermediate directory names define the build-root layout shared by
//! the pipeline stages.

/// Media type of the xRegistry layer blob.
pub const LAYER_MEDIA_TYPE: &str = "application/vnd.dspace.xregistry.layer.v1+json";

/// Media type of the image config blob.
pub const CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";

/// Media type of the image manifest blob.
pub const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Version string written to the `oci-layout` marker file.
pub const IMAGE_LAYOUT_VERSION: &str = "1.0.0";

/// Digest scheme prefix used by every descriptor reference.
pub const SHA_PREFIX: &str = "sha256:";

/// Root path under which source files are placed inside the layer archive.
pub const LAYER_ROOT: &str = "xregistry";

/// File extensions eligible for staging.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Default source directory, relative to the project root.
pub const XREGISTRY_SOURCE_DIR: &str = "src/main/xregistry";

/// Staging directory under the build root.
pub const XREGISTRY_STAGING_DIR: &str = "xregistry-staging";

/// Directory holding the layer archive and its digest sidecar.
pub const OCI_LAYERS_DIR: &str = "oci-layers";

/// File name of the layer tar archive.
pub const XREGISTRY_LAYER_ARCHIVE: &str = "xregistry-layer.tar";

/// File name of the layer digest sidecar (unprefixed hex).
pub const XREGISTRY_LAYER_SHA: &str = "xregistry-layer.sha256";

/// Directory holding the config blob before layout assembly.
pub const OCI_CONFIG_DIR: &str = "oci-config";

/// File name of the config blob.
pub const OCI_CONFIG_FILE: &str = "config.json";

/// Directory holding the manifest blob before layout assembly.
pub const OCI_MANIFEST_DIR: &str = "oci-manifest";

/// File name of the manifest blob.
pub const OCI_MANIFEST_FILE: &str = "manifest.json";

/// Directory holding the assembled image layout.
pub const OCI_LAYOUT_DIR: &str = "oci-layout";

/// File name of the layout-version marker inside the layout.
pub const OCI_LAYOUT_FILE: &str = "oci-layout";

/// File name of the image index inside the layout.
pub const OCI_INDEX_FILE: &str = "index.json";

/// Blob store path inside the layout.
pub const OCI_BLOBS_SHA_DIR: &str = "blobs/sha256";

/// Directory receiving the distribution tarball.
pub const DISTRIBUTIONS_DIR: &str = "distributions";

/// Creator identifier recorded in the config history entry.
pub const CREATED_BY: &str = "xregistry-oci-packager";

/// Comment recorded in the config history entry.
pub const LAYER_COMMENT: &str = "xRegistry policy layer";

/// Annotation key carrying the registry reference name in the index.
pub const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// Annotation key carrying the artifact title in the manifest.
pub const TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

/// Annotation key carrying the artifact version in the manifest.
pub const VERSION_ANNOTATION: &str = "org.opencontainers.image.version";

/// Suffix appended when deriving an artifact name from a directory name.
pub const ARTIFACT_SUFFIX: &str = "-xregistry";
