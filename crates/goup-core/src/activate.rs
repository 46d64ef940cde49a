use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use goup_backend::canonical_version;
use goup_platform::GoupPaths;
use log::{debug, info};

use crate::error::CoreError;

/// Point `<root>/current` at an installed version.
///
/// The old link is removed before the new one is created, so a crash in
/// between leaves no active version.
///
/// # Errors
/// Returns [`CoreError::NotInstalled`] without touching the existing link
/// when the version directory is missing, or an I/O error when the link
/// cannot be replaced.
pub fn activate(paths: &GoupPaths, version: &str) -> Result<PathBuf, CoreError> {
    let version = canonical_version(version);
    let target = paths.version_dir(&version);
    if !target.is_dir() {
        return Err(CoreError::NotInstalled { version });
    }

    let link = paths.current_link();
    remove_link(&link)?;
    create_link(&target, &link)?;

    info!("Default Go is set to '{version}'");
    Ok(target)
}

/// Name of the version `<root>/current` points at, if any.
#[must_use]
pub fn current_version(paths: &GoupPaths) -> Option<String> {
    let target = std::fs::read_link(paths.current_link()).ok()?;
    let name = target.file_name()?.to_str()?.to_string();
    debug!("Current link resolves to {name}");
    Some(name)
}

fn remove_link(link: &Path) -> Result<(), CoreError> {
    let removed = std::fs::remove_file(link);
    #[cfg(windows)]
    let removed = removed.or_else(|_| std::fs::remove_dir(link));

    match removed {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(CoreError::io_with_path("failed to remove", link, error)),
    }
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> Result<(), CoreError> {
    std::os::unix::fs::symlink(target, link)
        .map_err(|error| CoreError::io_with_path("failed to create symlink", link, error))
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path) -> Result<(), CoreError> {
    std::os::windows::fs::symlink_dir(target, link)
        .map_err(|error| CoreError::io_with_path("failed to create symlink", link, error))
}
