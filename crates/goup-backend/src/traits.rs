use async_trait::async_trait;
use std::path::Path;

use crate::error::ServiceError;
use crate::progress::ProgressSink;
use crate::types::{Release, canonical_version};

/// Lookup of published Go releases.
///
/// Implementations return releases sorted ascending by version.
#[async_trait]
pub trait ReleaseService: Send + Sync {
    /// `include_all` selects every release ever published instead of only
    /// the currently supported ones.
    async fn list(&self, include_all: bool) -> Result<Vec<Release>, ServiceError>;

    async fn latest(&self) -> Result<Release, ServiceError> {
        self.list(false)
            .await?
            .pop()
            .ok_or(ServiceError::NoRelease)
    }

    /// Releases whose version starts with `prefix`, which may be given with
    /// or without the `go` prefix.
    async fn filter(&self, prefix: &str) -> Result<Vec<Release>, ServiceError> {
        let prefix = canonical_version(prefix);
        Ok(self
            .list(true)
            .await?
            .into_iter()
            .filter(|release| release.version.starts_with(&prefix))
            .collect())
    }
}

/// Answer to a metadata-only probe of a download URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadResponse {
    pub status: reqwest::StatusCode,
    pub content_length: Option<u64>,
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn head_size(&self, url: &str) -> Result<HeadResponse, ServiceError>;

    /// Stream `url` into `dest`, returning the number of bytes written.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<u64, ServiceError>;
}
