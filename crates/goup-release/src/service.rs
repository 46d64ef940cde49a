use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use goup_backend::{Release, ReleaseService, ServiceError, VERSION_PREFIX};
use log::debug;
use semver::Version;

use crate::retry::RetryPolicy;

const OPERATION: &str = "list releases";
const INDEX_TIMEOUT: Duration = Duration::from_secs(30);

/// Release index served at `https://<host>/dl/?mode=json`.
pub struct GoReleaseService {
    client: reqwest::Client,
    host: String,
    retry: RetryPolicy,
}

impl GoReleaseService {
    #[must_use]
    pub fn new(client: reqwest::Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the backoff schedule; one attempt is made per entry.
    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry = RetryPolicy::new(delays);
        self
    }

    fn index_url(&self) -> String {
        format!("https://{}/dl/", self.host)
    }

    async fn list_once(&self, url: &str, include: &str) -> Result<Vec<Release>, ServiceError> {
        let response = self
            .client
            .get(url)
            .query(&[("mode", "json"), ("include", include)])
            .timeout(INDEX_TIMEOUT)
            .send()
            .await
            .map_err(|error| ServiceError::network_request(OPERATION, url, error))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                operation: OPERATION,
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|error| ServiceError::network_body(OPERATION, url, error))?;
        parse_releases(&body).map_err(|error| ServiceError::network_parse(OPERATION, url, error))
    }
}

#[async_trait]
impl ReleaseService for GoReleaseService {
    async fn list(&self, include_all: bool) -> Result<Vec<Release>, ServiceError> {
        let url = self.index_url();
        let include = if include_all { "all" } else { "" };
        debug!("Fetching release index from {url} (include={include:?})");

        let releases = self
            .retry
            .run(OPERATION, &url, || self.list_once(&url, include))
            .await?;

        debug!("Release index lists {} releases", releases.len());
        Ok(releases)
    }
}

/// Decode the JSON index and sort it ascending by Go version.
fn parse_releases(body: &str) -> Result<Vec<Release>, serde_json::Error> {
    let mut releases: Vec<Release> = serde_json::from_str(body)?;
    releases.sort_by(|a, b| compare_go_versions(&a.version, &b.version));
    Ok(releases)
}

fn compare_go_versions(a: &str, b: &str) -> Ordering {
    match (parse_go_version(a), parse_go_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Map Go's release names onto semver: `go1.21` is `1.21.0` and
/// `go1.21rc2` is `1.21.0-rc.2`, which sorts before the final release.
fn parse_go_version(version: &str) -> Option<Version> {
    let version = version.strip_prefix(VERSION_PREFIX)?;
    let suffix_idx = version
        .find(|ch: char| !ch.is_ascii_digit() && ch != '.')
        .unwrap_or(version.len());
    let (core, suffix) = version.split_at(suffix_idx);

    let mut parts = core.split('.');
    let major = parts.next()?.parse::<u64>().ok()?;
    let minor = parts.next().map_or(Some(0), |part| part.parse::<u64>().ok())?;
    let patch = parts.next().map_or(Some(0), |part| part.parse::<u64>().ok())?;
    if parts.next().is_some() {
        return None;
    }

    let normalized = if suffix.is_empty() {
        format!("{major}.{minor}.{patch}")
    } else {
        let digits = suffix.find(|ch: char| ch.is_ascii_digit()).unwrap_or(suffix.len());
        let (label, number) = suffix.split_at(digits);
        if number.is_empty() {
            format!("{major}.{minor}.{patch}-{label}")
        } else {
            format!("{major}.{minor}.{patch}-{label}.{number}")
        }
    };

    Version::parse(&normalized).ok()
}
