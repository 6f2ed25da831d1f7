use tracing::debug;

use super::report::{DownloadReport, FetchKind};
use super::{DownloadError, HttpClient};

/// A single timed fetch whose elapsed time is recorded in a [`DownloadReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub kind: FetchKind,
}

impl DownloadTask {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: FetchKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Builds one task of `kind` per URL, keeping their order.
    #[must_use]
    pub fn batch<I, S>(urls: I, kind: FetchKind) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter().map(|url| Self::new(url, kind)).collect()
    }

    /// Downloads the resource into memory and records the elapsed milliseconds.
    ///
    /// Returns the recorded time. Nothing is recorded when the fetch fails.
    ///
    /// # Errors
    ///
    /// Propagates any [`DownloadError`] from the fetch.
    pub async fn run(
        &self,
        client: &HttpClient,
        report: &DownloadReport,
    ) -> Result<u64, DownloadError> {
        debug!(url = %self.url, kind = %self.kind, "downloading");

        let body = client.fetch(&self.url).await?;
        let elapsed_ms = body.elapsed_ms();
        report.add_time(self.kind, elapsed_ms);

        debug!(
            url = %self.url,
            bytes = body.bytes.len(),
            elapsed_ms,
            "downloaded"
        );

        Ok(elapsed_ms)
    }
}
