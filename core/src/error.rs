use thiserror::Error;

/// xRegistry OCI packager error types
#[derive(Error, Debug)]
pub enum PackError {
    /// A pipeline stage ran before its upstream digest/size was available
    #[error("Pipeline ordering error: {0}")]
    PipelineOrdering(String),

    /// Source directory absent, not a directory, or without eligible files
    #[error("Invalid xRegistry source: {0}")]
    InvalidSource(String),

    /// Layer archive creation failed
    #[error("Layer error: {0}")]
    LayerError(String),

    /// Image layout assembly failed
    #[error("Layout error: {0}")]
    LayoutError(String),

    /// Distribution packaging failed
    #[error("Packaging error: {0}")]
    PackagingError(String),

    /// A recomputed digest disagrees with a stored reference
    #[error("Digest mismatch for {path}: referenced {expected} but computed {actual}")]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::SerializationError(err.to_string())
    }
}

/// Result type alias for packager operations
pub type Result<T> = std::result::Result<T, PackError>;
