//! HTTP client wrapper for in-memory fetches.
//!
//! This module provides the `HttpClient` struct which reads whole response
//! bodies into memory and measures how long each fetch took.

use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::user_agent;

/// A fully read response body and the time it took to receive it.
#[derive(Debug, Clone)]
pub struct TimedBody {
    /// Response body bytes.
    pub bytes: Vec<u8>,
    /// Time from sending the request until the last body byte arrived.
    pub elapsed: Duration,
}

impl TimedBody {
    /// Elapsed time in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// HTTP client for timed downloads.
///
/// This client is designed to be created once and reused for every fetch in
/// a run, taking advantage of connection pooling. No request timeout is set:
/// a stalled server stalls the measurement.
///
/// # Example
///
/// ```no_run
/// use iiif_timer::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let body = client.fetch("https://example.com/iiif/page-1/info.json").await?;
/// println!("{} bytes in {} ms", body.bytes.len(), body.elapsed_ms());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with gzip decompression and the crate user agent.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend or system
    /// configuration cannot be initialized.
    pub fn new() -> Result<Self, DownloadError> {
        let client = Client::builder()
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(DownloadError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Fetches `url` and reads the whole body into memory.
    ///
    /// Timing starts before the request is sent and stops after the final
    /// body chunk is read.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request or body stream fails
    /// - The server returns an error status (4xx, 5xx)
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<TimedBody, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let started = Instant::now();
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::network(url, e))?;
            bytes.extend_from_slice(&chunk);
        }
        let elapsed = started.elapsed();

        debug!(
            bytes = bytes.len(),
            elapsed_ms = elapsed.as_millis(),
            "fetch complete"
        );

        Ok(TimedBody { bytes, elapsed })
    }

    /// Fetches `url` and decodes the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`fetch`](Self::fetch), plus
    /// [`DownloadError::NotText`] when the body is not UTF-8.
    pub async fn fetch_text(&self, url: &str) -> Result<(String, Duration), DownloadError> {
        let body = self.fetch(url).await?;
        let text = String::from_utf8(body.bytes).map_err(|_| DownloadError::not_text(url))?;
        Ok((text, body.elapsed))
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
