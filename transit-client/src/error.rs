//! Error taxonomy shared by the data sources and stores.
//!
//! Errors are grouped by where they come from: the network, local storage,
//! or validation of data that was read successfully. None of them escape the
//! resolver, repository, eligibility cache or rescheduler; those layers log
//! and fall back instead.

use crate::domain::{InvalidRoute, InvalidStorageDay, TimeError};

/// Network failures while talking to the remote data source.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Could not connect to the host
    #[error("no connection: {0}")]
    NoConnection(String),

    /// Connect or read timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// Server answered with something other than 200 OK
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// No remote URL configured
    #[error("remote source not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::NoConnection(err.to_string())
        } else if let Some(status) = err.status() {
            NetworkError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            NetworkError::Other(err.to_string())
        }
    }
}

/// Failures reading or writing local files and stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    /// The file or record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Other(String),
}

impl StorageError {
    /// Classify an I/O error raised while reading `what`.
    pub fn read(what: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(what.to_string())
        } else {
            StorageError::Read(format!("{what}: {err}"))
        }
    }

    /// Wrap an I/O error raised while writing `what`.
    pub fn write(what: &str, err: std::io::Error) -> Self {
        StorageError::Write(format!("{what}: {err}"))
    }
}

/// Data was read but does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        if message.starts_with("missing field") {
            ValidationError::MissingField(message)
        } else {
            ValidationError::InvalidFormat(message)
        }
    }
}

impl From<InvalidRoute> for ValidationError {
    fn from(err: InvalidRoute) -> Self {
        ValidationError::MissingField(err.to_string())
    }
}

impl From<TimeError> for ValidationError {
    fn from(err: TimeError) -> Self {
        ValidationError::InvalidFormat(err.to_string())
    }
}

impl From<InvalidStorageDay> for ValidationError {
    fn from(err: InvalidStorageDay) -> Self {
        ValidationError::OutOfRange(err.to_string())
    }
}

/// Any failure of a single data tier.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.into())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Validation(err.into())
    }
}
