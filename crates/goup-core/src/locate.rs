use goup_backend::{ArtifactFile, ArtifactKind, Release};

use crate::error::CoreError;

/// Go publishes 32-bit ARM Linux builds under `armv6l`.
fn published_arch<'a>(os: &str, arch: &'a str) -> &'a str {
    if os == "linux" && arch == "arm" {
        "armv6l"
    } else {
        arch
    }
}

/// Select the binary archive of `release` built for `os`/`arch`.
///
/// # Errors
/// Returns [`CoreError::ArchiveNotFound`] when the release has no archive
/// for the platform.
pub fn archive_file<'a>(
    release: &'a Release,
    os: &str,
    arch: &str,
) -> Result<&'a ArtifactFile, CoreError> {
    let arch = published_arch(os, arch);

    release
        .files
        .iter()
        .find(|file| file.kind == ArtifactKind::Archive && file.os == os && file.arch == arch)
        .ok_or_else(|| CoreError::ArchiveNotFound {
            version: release.version.clone(),
            os: os.to_string(),
            arch: arch.to_string(),
        })
}
