use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::paths::GoupPaths;
use crate::target::{go_arch, go_os};

pub const DEFAULT_GO_HOST: &str = "golang.google.cn";
pub const DEFAULT_SOURCE_GIT_URL: &str = "https://github.com/golang/go";
pub const DEFAULT_UPSTREAM_GIT_URL: &str = "https://go.googlesource.com/go";

const ENV_HOME: &str = "GOUP_HOME";
const ENV_GO_HOST: &str = "GOUP_GO_HOST";
const ENV_GO_ARCH: &str = "GOUP_GO_ARCH";
const ENV_SOURCE_GIT_URL: &str = "GOUP_GO_SOURCE_GIT_URL";
const ENV_UPSTREAM_GIT_URL: &str = "GOUP_GO_SOURCE_UPSTREAM_GIT_URL";
const ENV_ASSUME_YES: &str = "GOUP_ASSUME_YES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Could not determine home directory; set GOUP_HOME")]
    HomeDirUnavailable,
}

/// Settings shared by every goup component.
///
/// Built once from the process environment and handed to each component at
/// construction, so nothing downstream reads environment variables itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoupConfig {
    pub paths: GoupPaths,
    pub go_host: String,
    pub go_os: String,
    pub go_arch: String,
    pub source_git_url: String,
    pub upstream_git_url: String,
    pub assume_yes: bool,
}

impl GoupConfig {
    /// Read overrides from the process environment.
    ///
    /// # Errors
    /// Returns an error when `GOUP_HOME` is unset and the user's home
    /// directory cannot be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup. Empty values
    /// count as unset.
    ///
    /// # Errors
    /// Returns an error when no root directory can be determined.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let root = match get(ENV_HOME) {
            Some(home) => PathBuf::from(home),
            None => dirs::home_dir()
                .ok_or(ConfigError::HomeDirUnavailable)?
                .join(".go"),
        };

        let config = Self {
            paths: GoupPaths::new(root),
            go_host: get(ENV_GO_HOST).unwrap_or_else(|| DEFAULT_GO_HOST.to_string()),
            go_os: go_os().to_string(),
            go_arch: get(ENV_GO_ARCH).unwrap_or_else(|| go_arch().to_string()),
            source_git_url: get(ENV_SOURCE_GIT_URL)
                .unwrap_or_else(|| DEFAULT_SOURCE_GIT_URL.to_string()),
            upstream_git_url: get(ENV_UPSTREAM_GIT_URL)
                .unwrap_or_else(|| DEFAULT_UPSTREAM_GIT_URL.to_string()),
            assume_yes: get(ENV_ASSUME_YES).is_some_and(|value| parse_flag(&value)),
        };

        debug!("Resolved configuration: {config:?}");
        Ok(config)
    }

    #[must_use]
    pub fn with_go_host(mut self, host: impl Into<String>) -> Self {
        self.go_host = host.into();
        self
    }

    #[must_use]
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = GoupPaths::new(root);
        self
    }

    #[must_use]
    pub fn with_target(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.go_os = os.into();
        self.go_arch = arch.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}
