use std::path::Path;

use goup_backend::{InstalledVersion, VERSION_PREFIX};
use goup_platform::GoupConfig;
use log::debug;

use crate::activate::current_version;
use crate::error::CoreError;

/// Zero-byte file written into a version directory once extraction finished.
pub const INSTALLED_MARKER: &str = ".unpacked-success";

const TIP_VERSION: &str = "gotip";

#[must_use]
pub fn is_installed(dir: &Path) -> bool {
    dir.join(INSTALLED_MARKER).is_file()
}

/// # Errors
/// Returns an error if the directory or one of its parents cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), CoreError> {
    std::fs::create_dir_all(dir)
        .map_err(|error| CoreError::io_with_path("failed to create directory", dir, error))
}

/// # Errors
/// Returns an error if the marker file cannot be created.
pub fn mark_installed(dir: &Path) -> Result<(), CoreError> {
    let marker = dir.join(INSTALLED_MARKER);
    std::fs::File::create(&marker)
        .map_err(|error| CoreError::io_with_path("failed to write marker", &marker, error))?;
    debug!("Marked {} as installed", dir.display());
    Ok(())
}

fn tip_is_built(dir: &Path, go_os: &str) -> bool {
    let binary = if go_os == "windows" { "go.exe" } else { "go" };
    dir.join("bin").join(binary).is_file()
}

/// Installed versions under the goup root, sorted by name. A `gotip`
/// checkout counts once its toolchain binary for `config.go_os` is built.
///
/// A missing root is treated as an empty installation.
///
/// # Errors
/// Returns an error if the root exists but cannot be read.
pub fn list_installed(config: &GoupConfig) -> Result<Vec<InstalledVersion>, CoreError> {
    let paths = &config.paths;
    let root = paths.root();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            return Err(CoreError::io_with_path("failed to read directory", root, error));
        }
    };

    let active = current_version(paths);
    let mut installed = Vec::new();

    for entry in entries {
        let entry =
            entry.map_err(|error| CoreError::io_with_path("failed to read directory", root, error))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type().is_ok_and(|kind| kind.is_dir());
        if !is_dir || !name.starts_with(VERSION_PREFIX) {
            continue;
        }

        let dir = entry.path();
        let complete = if name == TIP_VERSION {
            tip_is_built(&dir, &config.go_os)
        } else {
            is_installed(&dir)
        };
        if !complete {
            debug!("Skipping incomplete installation {}", dir.display());
            continue;
        }

        installed.push(InstalledVersion {
            is_active: active.as_deref() == Some(name.as_str()),
            version: name,
            dir,
        });
    }

    installed.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(installed)
}
