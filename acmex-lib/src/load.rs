//! Reading a store document from disk.
//!
//! The store is re-read on every call; there is no cache. A file caught
//! mid-write either still parses as a complete document or fails here.

use crate::decoder::{decode, DecodeError};
use crate::store::Store;
use std::path::{Path, PathBuf};

/// Maximum accepted store file size (10 MiB).
pub const MAX_STORE_BYTES: u64 = 10 * 1024 * 1024;

/// The store could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "store {} is too large ({size} bytes, max {} bytes)",
        path.display(),
        MAX_STORE_BYTES
    )]
    TooLarge { path: PathBuf, size: u64 },

    #[error("store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Read and decode the store file at `path`.
pub fn read_store(path: &Path) -> Result<Store, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(path).map_err(io_error)?;
    if meta.len() > MAX_STORE_BYTES {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
        });
    }
    let bytes = std::fs::read(path).map_err(io_error)?;
    let store = parse_store(&bytes)?;
    tracing::debug!(path = %path.display(), resolvers = store.len(), "loaded store");
    Ok(store)
}

/// Parse JSON bytes and validate them as a store.
pub fn parse_store(bytes: &[u8]) -> Result<Store, LoadError> {
    let raw: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(decode(&raw)?)
}
