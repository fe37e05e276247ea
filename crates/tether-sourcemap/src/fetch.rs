//! Source-map body fetching.
//!
//! The engine never touches the network or filesystem directly; it goes
//! through an injected [`SourceMapFetcher`]. The production fetcher
//! reads `file:` URLs locally and GETs `http(s):` URLs; tests inject a
//! [`StaticFetcher`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::SourceMapError;

/// Fetches the body behind a resolved source-map URL.
#[async_trait]
pub trait SourceMapFetcher: Send + Sync {
    /// Retrieve the map text at `url`.
    async fn fetch(&self, url: &Url) -> Result<String, SourceMapError>;
}

/// Production fetcher: local reads for `file:`, HTTP GET for `http(s):`.
pub struct DefaultFetcher {
    http: Option<reqwest::Client>,
}

impl DefaultFetcher {
    /// Build a fetcher. When `fetch_http` is false, http(s) references
    /// fail instead of leaving the machine.
    pub fn new(fetch_http: bool, http_timeout: Duration) -> Result<Self, SourceMapError> {
        let http = if fetch_http {
            let client = reqwest::Client::builder()
                .timeout(http_timeout)
                .build()
                .map_err(|e| SourceMapError::Fetch(format!("http client: {}", e)))?;
            Some(client)
        } else {
            None
        };
        Ok(Self { http })
    }
}

#[async_trait]
impl SourceMapFetcher for DefaultFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, SourceMapError> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| SourceMapError::Fetch(format!("invalid file url: {}", url)))?;
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| SourceMapError::Fetch(format!("{}: {}", path.display(), e)))
            }
            "http" | "https" => {
                let client = self
                    .http
                    .as_ref()
                    .ok_or_else(|| SourceMapError::Fetch("http fetching disabled".into()))?;
                let response = client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(|e| SourceMapError::Fetch(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(SourceMapError::Fetch(format!("HTTP {}", response.status())));
                }
                response
                    .text()
                    .await
                    .map_err(|e| SourceMapError::Fetch(e.to_string()))
            }
            other => Err(SourceMapError::Fetch(format!(
                "unsupported scheme: {}",
                other
            ))),
        }
    }
}

/// In-memory fetcher for tests and injection.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    entries: HashMap<String, String>,
}

impl StaticFetcher {
    /// Create an empty fetcher; every fetch fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body served for `url`.
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(url.into(), body.into());
    }
}

#[async_trait]
impl SourceMapFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, SourceMapError> {
        self.entries
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| SourceMapError::Fetch(format!("no entry for {}", url)))
    }
}
