//! Acquisition, verification, extraction, installation and activation of Go
//! toolchains, plus the source build workflow for `tip` and pending CLs.
//!
//! The crate talks to the network only through the
//! [`goup_backend::Downloader`] seam and to external programs only through
//! [`ProcessRunner`], so every step can be driven from tests.

mod activate;
mod error;
mod extract;
mod install;
mod locate;
mod process;
mod store;
mod tip;
mod verify;

pub use activate::{activate, current_version};
pub use error::{CoreError, ErrorClass, ProcessError};
pub use extract::unpack_archive;
pub use install::{InstallOutcome, Installer};
pub use locate::archive_file;
pub use process::{CommandSpec, ProcessRunner, SystemRunner};
pub use store::{INSTALLED_MARKER, ensure_dir, is_installed, list_installed, mark_installed};
pub use tip::{Confirm, PatchSetRef, SourceBuild, StdinConfirm, resolve_patch_set};
pub use verify::{sha256_file, verify_sha256};
