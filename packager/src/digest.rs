//! Content digest engine.
//!
//! Streams SHA-256 over byte sources in bounded chunks and carries the
//! result as a validated hex [`Digest`]. Every blob reference in the
//! config, manifest, and index is derived from this module's output.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};

use xregistry_oci_core::constants::SHA_PREFIX;
use xregistry_oci_core::{PackError, Result};

/// Read buffer size for streaming digest computation.
const DIGEST_CHUNK_SIZE: usize = 8192;

/// A SHA-256 content digest, 64 lowercase hex characters.
///
/// Stored unprefixed; descriptor references use [`Digest::prefixed`],
/// blob-store file names use [`Digest::hex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Parse an unprefixed hex digest.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(PackError::SerializationError(format!(
                "invalid SHA-256 digest: {hex}"
            )));
        }
        Ok(Digest(hex.to_string()))
    }

    /// Parse a digest in `sha256:<hex>` reference form.
    pub fn from_prefixed(reference: &str) -> Result<Self> {
        let hex = reference.strip_prefix(SHA_PREFIX).ok_or_else(|| {
            PackError::SerializationError(format!(
                "digest reference missing {SHA_PREFIX} prefix: {reference}"
            ))
        })?;
        Self::from_hex(hex)
    }

    /// The unprefixed hex form, used as the blob-store file name.
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// The `sha256:<hex>` reference form used by descriptors.
    pub fn prefixed(&self) -> String {
        format!("{SHA_PREFIX}{}", self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SHA_PREFIX}{}", self.0)
    }
}

/// A blob's identity: content digest plus byte length.
///
/// Published by each pipeline stage and consumed by the next; replaces
/// untyped digest/size properties threaded through shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Content digest of the blob bytes
    pub digest: Digest,
    /// Blob size in bytes
    pub size: u64,
}

/// Compute the SHA-256 digest of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of a reader, streaming in bounded chunks.
///
/// Read failures are returned as-is; the caller decides whether a
/// partial read is fatal.
pub fn sha256_reader<R: Read>(reader: &mut R) -> Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; DIGEST_CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(Digest(hex::encode(hasher.finalize())))
}

/// Compute the SHA-256 digest of a file by streaming its contents.
pub fn sha256_file(path: &Path) -> Result<Digest> {
    let mut file = File::open(path).map_err(|e| {
        PackError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    sha256_reader(&mut file)
}
