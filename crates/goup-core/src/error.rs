use std::path::{Path, PathBuf};

use goup_backend::ServiceError;
use thiserror::Error;

/// Broad category of a [`CoreError`], used by callers to decide how to
/// present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Integrity,
    UnsafeInput,
    Environment,
    Interrupted,
    Io,
    Network,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("target os {os} arch {arch} archive not found for {version}")]
    ArchiveNotFound {
        version: String,
        os: String,
        arch: String,
    },

    #[error("no binary release of {version} for {os}/{arch} at {url}")]
    NoBinaryRelease {
        version: String,
        os: String,
        arch: String,
        url: String,
    },

    #[error("server returned {status} checking size of {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("server did not report a content length for {url}")]
    MissingContentLength { url: String },

    #[error("error checking {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: ServiceError,
    },

    #[error("error downloading {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: ServiceError,
    },

    #[error("downloaded file {} size {actual} doesn't match server size {expected}", .path.display())]
    SizeMismatch {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },

    #[error("{} corrupt? does not have expected SHA-256 of {expected} (got {actual})", .path.display())]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("only wrote {written} bytes to {}; expected {expected}", .path.display())]
    ShortWrite {
        path: PathBuf,
        written: u64,
        expected: u64,
    },

    #[error("archive contained invalid entry name {name:?}")]
    UnsafeEntry { name: String },

    #[error("unsupported archive file {}", .path.display())]
    UnsupportedArchive { path: PathBuf },

    #[error("archive entry {name} contained unsupported file type {kind}")]
    UnsupportedEntry { name: String, kind: String },

    #[error("extracting archive {}: {source}", .archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Go version {version} is not installed. Install it with `goup install`.")]
    NotInstalled { version: String },

    #[error("CL {cl} not found")]
    ClNotFound { cl: String },

    #[error("invalid CL number {cl:?}")]
    InvalidChangeList { cl: String },

    #[error("interrupted")]
    Interrupted,

    #[error("failed to {step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context} {}: {source}", .path.display())]
    Zip {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl CoreError {
    pub(crate) fn io_with_path(
        context: &'static str,
        path: &Path,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn zip(context: &'static str, path: &Path, source: zip::result::ZipError) -> Self {
        Self::Zip {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn step(step: &'static str, source: ProcessError) -> Self {
        Self::Step { step, source }
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ArchiveNotFound { .. }
            | Self::NoBinaryRelease { .. }
            | Self::NotInstalled { .. }
            | Self::ClNotFound { .. } => ErrorClass::NotFound,
            Self::SizeMismatch { .. } | Self::DigestMismatch { .. } | Self::ShortWrite { .. } => {
                ErrorClass::Integrity
            }
            Self::UnsafeEntry { .. }
            | Self::UnsupportedArchive { .. }
            | Self::UnsupportedEntry { .. }
            | Self::InvalidChangeList { .. }
            | Self::Zip { .. } => ErrorClass::UnsafeInput,
            Self::Extract { source, .. } => source.class(),
            Self::Step { .. } => ErrorClass::Environment,
            Self::Interrupted => ErrorClass::Interrupted,
            Self::Io { .. } => ErrorClass::Io,
            Self::UnexpectedStatus { .. }
            | Self::MissingContentLength { .. }
            | Self::Probe { .. }
            | Self::Download { .. } => ErrorClass::Network,
        }
    }
}

/// Failure of an external program started through a
/// [`ProcessRunner`](crate::ProcessRunner).
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{program} not found in PATH")]
    NotFound { program: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
