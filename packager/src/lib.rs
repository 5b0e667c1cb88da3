//! Packaging engine for xRegistry OCI artifacts.
//!
//! This crate turns a directory of registry metadata files into a
//! single-layer OCI image layout. The pipeline is a strictly linear
//! digest chain: every stage's serialized bytes are an input to the
//! next stage's digest computation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Build root                               │
//! │                                                              │
//! │  build/                                                      │
//! │  ├── xregistry-staging/        (filtered source files)       │
//! │  ├── oci-layers/                                             │
//! │  │   ├── xregistry-layer.tar   (layer blob)                  │
//! │  │   └── xregistry-layer.sha256                              │
//! │  ├── oci-config/config.json    (config blob)                 │
//! │  ├── oci-manifest/manifest.json (manifest blob)              │
//! │  ├── oci-layout/                                             │
//! │  │   ├── oci-layout            (layout marker)               │
//! │  │   ├── index.json            (image index)                 │
//! │  │   └── blobs/sha256/<digest> (blob store)                  │
//! │  └── distributions/<name>-<version>.tar                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod digest;
pub mod layer;
pub mod layout;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod staging;
pub mod verify;

pub use config::{ConfigBuilder, ImageConfig};
pub use digest::{sha256_bytes, sha256_file, sha256_reader, BlobRef, Digest};
pub use layer::{build_layer, digest_layer};
pub use layout::assemble_layout;
pub use manifest::{Descriptor, ImageManifest, ManifestBuilder};
pub use package::package_distribution;
pub use pipeline::{BuildOutcome, BuildStage, Pipeline, StageArtifact};
pub use staging::stage_sources;
pub use verify::{verify_layout, VerifyReport};
