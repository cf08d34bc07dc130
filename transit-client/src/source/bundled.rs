//! Route data shipped with the application.

use std::path::PathBuf;

use crate::error::{SourceError, StorageError};

/// Route document compiled into the binary.
const EMBEDDED_ROUTES: &str = include_str!("../../data/bundled_routes.json");

/// Where the bundled route document comes from.
#[derive(Debug, Clone, Default)]
pub enum BundledSource {
    /// The document compiled into the binary.
    #[default]
    Embedded,
    /// A document installed alongside the application.
    File(PathBuf),
    /// A document held in memory.
    Inline(String),
    /// No bundled data.
    Missing,
}

impl BundledSource {
    /// Read the raw bundled document.
    pub async fn load(&self) -> Result<String, SourceError> {
        match self {
            BundledSource::Embedded => Ok(EMBEDDED_ROUTES.to_string()),
            BundledSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| StorageError::read("bundled routes", e).into()),
            BundledSource::Inline(body) => Ok(body.clone()),
            BundledSource::Missing => {
                Err(StorageError::NotFound("no bundled route data".to_string()).into())
            }
        }
    }
}
