use std::future::Future;
use std::time::Duration;

use goup_backend::ServiceError;
use log::{debug, warn};

const DEFAULT_DELAYS_SECS: [u64; 5] = [0, 1, 2, 4, 8];

/// Fixed backoff schedule shared by every network call: one attempt per
/// entry, sleeping for the entry's delay first.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_DELAYS_SECS
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
        )
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Run `attempt` until it succeeds, fails with a non-transient error, or
    /// the schedule runs out. The last transient error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        url: &str,
        mut attempt: F,
    ) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut last_error = None;

        for (index, delay) in self.delays.iter().enumerate() {
            if !delay.is_zero() {
                debug!("Retrying {operation} for {url} in {delay:?}");
                tokio::time::sleep(*delay).await;
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() => {
                    warn!("Attempt {} to {operation} {url} failed: {error}", index + 1);
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| no_attempts(operation, url)))
    }
}

pub(crate) fn no_attempts(operation: &'static str, url: &str) -> ServiceError {
    ServiceError::network_request(operation, url, "no attempts configured")
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use goup_backend::{NetworkStage, ServiceError};
    use reqwest::StatusCode;

    use super::RetryPolicy;

    const URL: &str = "https://go.dev/dl/";

    fn quick(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(vec![Duration::ZERO; attempts])
    }

    fn unavailable() -> ServiceError {
        ServiceError::Status {
            operation: "list releases",
            url: URL.to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[test]
    fn default_schedule_has_five_attempts() {
        let secs: Vec<_> = RetryPolicy::default()
            .delays()
            .iter()
            .map(Duration::as_secs)
            .collect();
        assert_eq!(secs, [0, 1, 2, 4, 8]);
    }

    #[tokio::test]
    async fn transient_errors_use_every_attempt() {
        let calls = Cell::new(0);

        let result: Result<(), _> = quick(3)
            .run("list releases", URL, || {
                calls.set(calls.get() + 1);
                async { Err(unavailable()) }
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Status { .. })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_error_stops_immediately() {
        let calls = Cell::new(0);

        let result: Result<(), _> = quick(3)
            .run("list releases", URL, || {
                calls.set(calls.get() + 1);
                async { Err(ServiceError::network_parse("list releases", URL, "bad json")) }
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Network {
                stage: NetworkStage::ResponseParse,
                ..
            })
        ));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn success_after_transient_failure() {
        let calls = Cell::new(0);

        let result = quick(5)
            .run("list releases", URL, || {
                calls.set(calls.get() + 1);
                let outcome = if calls.get() < 2 { Err(unavailable()) } else { Ok(7) };
                async move { outcome }
            })
            .await;

        assert_eq!(result.expect("second attempt should succeed"), 7);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn empty_schedule_reports_request_error() {
        let calls = Cell::new(0);

        let result: Result<(), _> = RetryPolicy::new(Vec::new())
            .run("list releases", URL, || {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Network {
                stage: NetworkStage::Request,
                ..
            })
        ));
        assert_eq!(calls.get(), 0);
    }
}
