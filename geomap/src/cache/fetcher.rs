//! Tile download over HTTP.
//!
//! The [`HttpClient`] trait abstracts the transport so tests can inject a
//! mock client. [`TileFetcher`] builds the slippy-map request path and
//! normalizes every failure mode (transport error, non-2xx status, empty
//! payload) into a uniform [`FetchError`]. Retries, if any, belong to the
//! caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::tile::TileKey;

/// Errors from a single tile fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transport failure or non-2xx response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered 2xx with an empty body.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// The configured base URL cannot form a request.
    #[error("invalid tile server URL: {0}")]
    InvalidUrl(String),
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(30)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))
    }
}

/// Downloads single tiles from a slippy-map tile server.
pub struct TileFetcher {
    client: Arc<dyn HttpClient>,
    base_url: String,
}

impl TileFetcher {
    /// Create a fetcher for the given tile server.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP transport
    /// * `base_url` - Tile server base URL, normalized to end with `/`
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    /// Request URL for a tile key: `{base_url}{zoom}/{x}/{y}.png`.
    pub fn tile_url(&self, key: &TileKey) -> String {
        format!("{}{}/{}/{}.png", self.base_url, key.zoom(), key.x(), key.y())
    }

    /// Fetch the raster bytes for one tile.
    ///
    /// Any transport error, non-2xx response or empty payload is a uniform
    /// fetch failure. No retry happens at this layer.
    pub fn fetch(&self, key: &TileKey) -> Result<Vec<u8>, FetchError> {
        if !self.base_url.contains("://") {
            // A malformed base URL is a configuration defect; surface it
            // through the same failure path as a transport error
            return Err(FetchError::InvalidUrl(self.base_url.clone()));
        }

        let url = self.tile_url(key);
        debug!(%key, url = %url, "fetching tile");

        let bytes = self.client.get(&url)?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyResponse(url));
        }
        Ok(bytes)
    }
}
