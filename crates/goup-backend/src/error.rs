use thiserror::Error;

/// Failures of the release metadata and download services.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network error during {operation} ({stage}) for {url}: {details}")]
    Network {
        operation: &'static str,
        stage: NetworkStage,
        url: String,
        details: String,
    },

    #[error("{operation} failed with HTTP {status} for {url}")]
    Status {
        operation: &'static str,
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("copied {actual} bytes from {url}; expected {expected}")]
    Truncated {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("No Go release found")]
    NoRelease,

    #[error("IO error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("response body")]
    Body,
    #[error("response parse")]
    ResponseParse,
}

impl ServiceError {
    pub fn network_request<E>(operation: &'static str, url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::Request,
            url: url.to_string(),
            details: error.to_string(),
        }
    }

    pub fn network_body<E>(operation: &'static str, url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::Body,
            url: url.to_string(),
            details: error.to_string(),
        }
    }

    pub fn network_parse<E>(operation: &'static str, url: &str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::ResponseParse,
            url: url.to_string(),
            details: error.to_string(),
        }
    }

    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { stage, .. } => *stage != NetworkStage::ResponseParse,
            Self::Status { status, .. } => status.is_server_error(),
            Self::Truncated { .. } => true,
            Self::ClientBuild(_) | Self::NoRelease | Self::Io { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NetworkStage, ServiceError};

    #[test]
    fn network_helpers_set_expected_stage() {
        let request = ServiceError::network_request("list releases", "https://x/dl/", "timed out");
        assert!(matches!(
            request,
            ServiceError::Network {
                operation: "list releases",
                stage: NetworkStage::Request,
                ..
            }
        ));

        let parse = ServiceError::network_parse("list releases", "https://x/dl/", "bad json");
        assert!(matches!(
            parse,
            ServiceError::Network {
                stage: NetworkStage::ResponseParse,
                ..
            }
        ));
    }

    #[test]
    fn transient_classification() {
        assert!(ServiceError::network_body("download", "u", "reset").is_transient());
        assert!(!ServiceError::network_parse("list", "u", "eof").is_transient());
        assert!(
            ServiceError::Status {
                operation: "download",
                url: "u".to_string(),
                status: reqwest::StatusCode::BAD_GATEWAY,
            }
            .is_transient()
        );
        assert!(
            !ServiceError::Status {
                operation: "download",
                url: "u".to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            }
            .is_transient()
        );
    }

    #[test]
    fn truncated_display_names_both_sizes() {
        let error = ServiceError::Truncated {
            url: "https://go.dev/dl/go.tar.gz".to_string(),
            expected: 10,
            actual: 4,
        };

        assert_eq!(
            error.to_string(),
            "copied 4 bytes from https://go.dev/dl/go.tar.gz; expected 10"
        );
    }
}
