//! Blocking HTTP transport.
//!
//! Installers talk to the network only through [`HttpFetch`], which keeps the
//! retry policy and the install procedures testable without a server.

use std::time::Duration;
use tracing::debug;

use crate::{Error, Result};

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body. Empty for error statuses.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET request.
pub trait HttpFetch {
    /// Fetch `url`, following redirects.
    ///
    /// Error statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the request could not be completed.
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// [`HttpFetch`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with the ensureconda user agent.
    ///
    /// Downloads of a full conda-standalone package can take minutes, so
    /// only connecting is bounded; the transfer itself is not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpClient`] if the TLS backend fails to initialize.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ensureconda/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()
            .map_err(|e| Error::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::network(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HttpResponse::new(status.as_u16(), Vec::new()));
        }

        let body = response
            .bytes()
            .map_err(|e| Error::network(url, format!("failed to read body: {e}")))?;
        debug!(%url, bytes = body.len(), "Downloaded");
        Ok(HttpResponse::new(status.as_u16(), body.to_vec()))
    }
}
