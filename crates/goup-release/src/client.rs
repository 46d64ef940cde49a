use std::time::Duration;

use goup_backend::ServiceError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared HTTP client for metadata lookups and archive downloads.
///
/// Only connect and per-read timeouts are set; archives are large enough
/// that a whole-request deadline would cut off slow but healthy downloads.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_client() -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .user_agent(format!("goup/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ServiceError::ClientBuild)
}
