//! Remote route data client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::{NetworkError, SourceError, ValidationError};

/// `User-Agent` sent with every request.
const USER_AGENT: &str = concat!("transit-client/", env!("CARGO_PKG_VERSION"));

/// Something that can fetch the raw route document.
///
/// Implementations return the response body verbatim; parsing is left to the
/// resolver so the exact bytes can be written to the disk cache.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<String, SourceError>;
}

/// Configuration for the HTTP remote source.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Full URL of the route document. `None` disables the remote tier.
    pub url: Option<String>,
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// Longest wait for the next chunk of the response, headers included
    pub read_timeout: Duration,
}

impl RemoteConfig {
    /// Create a config for the given URL with default timeouts (10s connect, 15s read).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// A config with no URL; every fetch fails with `NotConfigured`.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP client for the route document.
#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    http: reqwest::Client,
    url: Option<String>,
}

impl HttpRemoteSource {
    pub fn new(config: RemoteConfig) -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;

        Ok(Self {
            http,
            url: config.url.filter(|u| !u.trim().is_empty()),
        })
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_raw(&self) -> Result<String, SourceError> {
        let url = self.url.as_deref().ok_or(NetworkError::NotConfigured)?;

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::Http {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            }
            .into());
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ValidationError::InvalidFormat("empty response body".to_string()).into());
        }

        Ok(body)
    }
}
