use goup_backend::ServiceError;
use goup_core::{CoreError, ProcessError};
use goup_platform::ConfigError;
use thiserror::Error;

/// Everything a command can fail with. Sources already carry their own
/// context, so most variants display them unchanged.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to list Go tags: {0}")]
    Process(#[from] ProcessError),

    #[error("no matched go version found")]
    NoMatchedVersion,

    #[error("a change list can only be installed with `tip`, not with {version:?}")]
    UnexpectedChangeList { version: String },

    #[error("No Go version found")]
    NoVersionFound,

    #[error("invalid search pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[cfg(test)]
mod tests {
    use goup_core::CoreError;

    use super::CliError;

    #[test]
    fn core_errors_display_unchanged() {
        let error = CliError::from(CoreError::NotInstalled {
            version: "go1.99.0".to_string(),
        });

        assert_eq!(
            error.to_string(),
            "Go version go1.99.0 is not installed. Install it with `goup install`."
        );
    }
}
