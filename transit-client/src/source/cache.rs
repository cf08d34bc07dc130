//! Disk cache for the last successfully fetched route document.
//!
//! The file holds the remote response body verbatim. It is a fallback for
//! offline use, not a source of truth, so it never expires on its own.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::StorageError;
use crate::persist::write_atomic;

/// Default cache file name inside the data directory.
pub const DEFAULT_CACHE_FILE: &str = "routes_cache.json";

/// Disk cache for the raw route document.
#[derive(Debug, Clone)]
pub struct PayloadCache {
    path: PathBuf,
}

impl PayloadCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file named [`DEFAULT_CACHE_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_CACHE_FILE))
    }

    /// Read the cached document.
    ///
    /// Returns `StorageError::NotFound` if nothing has been cached yet.
    pub async fn load(&self) -> Result<String, StorageError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::read("route cache", e))?;
        if body.trim().is_empty() {
            return Err(StorageError::NotFound("route cache is empty".to_string()));
        }
        Ok(body)
    }

    /// Write `body` to the cache, creating parent directories if needed.
    pub async fn save(&self, body: &str) -> Result<(), StorageError> {
        write_atomic(&self.path, body, "route cache").await
    }

    /// How long ago the cache was last written, if it exists.
    pub async fn age(&self) -> Option<Duration> {
        let modified = tokio::fs::metadata(&self.path).await.ok()?.modified().ok()?;
        SystemTime::now().duration_since(modified).ok()
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
