use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use goup_backend::{Downloader, HeadResponse, ProgressSink, ServiceError};
use log::{debug, info, warn};
use reqwest::header::CONTENT_LENGTH;
use tokio::io::AsyncWriteExt;

use crate::retry::{RetryPolicy, no_attempts};

const PROBE_OPERATION: &str = "probe download";
const DOWNLOAD_OPERATION: &str = "download";

/// Streams archives to disk. The HEAD probe and the GET both retry
/// transient failures with a fixed backoff schedule.
pub struct HttpDownloader {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpDownloader {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the backoff schedule; one attempt is made per entry.
    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry = RetryPolicy::new(delays);
        self
    }

    async fn head_once(&self, url: &str) -> Result<HeadResponse, ServiceError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|error| ServiceError::network_request(PROBE_OPERATION, url, error))?;

        let head = HeadResponse {
            status: response.status(),
            content_length: header_content_length(response.headers()),
        };
        debug!("HEAD {url} -> {} ({:?} bytes)", head.status, head.content_length);
        Ok(head)
    }

    async fn download_once(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, ServiceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| ServiceError::network_request(DOWNLOAD_OPERATION, url, error))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                operation: DOWNLOAD_OPERATION,
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total = response.content_length();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|error| ServiceError::io(dest, error))?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|error| ServiceError::network_body(DOWNLOAD_OPERATION, url, error))?;
            file.write_all(&chunk)
                .await
                .map_err(|error| ServiceError::io(dest, error))?;
            downloaded += chunk.len() as u64;
            progress.on_progress(downloaded, total);
        }

        file.flush()
            .await
            .map_err(|error| ServiceError::io(dest, error))?;

        if let Some(expected) = total
            && downloaded != expected
        {
            return Err(ServiceError::Truncated {
                url: url.to_string(),
                expected,
                actual: downloaded,
            });
        }

        progress.finish(downloaded, total);
        info!("Download complete: {downloaded} bytes");
        Ok(downloaded)
    }
}

/// Content-Length as sent by the server. Taken from the header because a
/// HEAD response has no body to size.
fn header_content_length(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn head_size(&self, url: &str) -> Result<HeadResponse, ServiceError> {
        self.retry
            .run(PROBE_OPERATION, url, || self.head_once(url))
            .await
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, ServiceError> {
        // The progress sink is lent to each attempt, so this loop cannot go
        // through `RetryPolicy::run`.
        let mut last_error = None;

        for (attempt, delay) in self.retry.delays().iter().enumerate() {
            if !delay.is_zero() {
                debug!("Retrying {url} in {delay:?}");
                tokio::time::sleep(*delay).await;
            }

            match self.download_once(url, dest, &mut *progress).await {
                Ok(written) => return Ok(written),
                Err(error) if error.is_transient() => {
                    warn!("Download attempt {} of {url} failed: {error}", attempt + 1);
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| no_attempts(DOWNLOAD_OPERATION, url)))
    }
}
