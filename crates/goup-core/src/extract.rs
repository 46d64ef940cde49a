use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use flate2::read::GzDecoder;
use log::{debug, warn};

use crate::error::CoreError;

/// Leading directory every Go release archive nests its tree under.
const ARCHIVE_ROOT: &str = "go";
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const DEFAULT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    fn from_path(path: &Path) -> Result<Self, CoreError> {
        let name = path.to_string_lossy();
        if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else if name.ends_with(".tar.gz") {
            Ok(Self::TarGz)
        } else {
            Err(CoreError::UnsupportedArchive {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Unpack a `.zip` or `.tar.gz` Go release archive into `dest`, dropping the
/// leading `go/` directory from every entry.
///
/// Entries are validated before anything is written for them. The first
/// unsafe or unsupported entry aborts the extraction; files written for
/// earlier entries are left in place.
///
/// # Errors
/// Returns an error for unsupported archive types, unsafe entry names,
/// unsupported entry types, short writes and I/O failures.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<(), CoreError> {
    let format = ArchiveFormat::from_path(archive)?;
    let mut writer = EntryWriter::new(dest);

    match format {
        ArchiveFormat::Zip => unpack_zip(archive, &mut writer),
        ArchiveFormat::TarGz => unpack_tar_gz(archive, &mut writer),
    }?;

    debug!("Extraction complete to {}", dest.display());
    Ok(())
}

fn valid_rel_path(name: &str) -> bool {
    !(name.is_empty()
        || name.contains('\\')
        || name.contains(':')
        || name.starts_with('/')
        || name.contains("../")
        || name.split('/').any(|segment| segment == ".."))
}

fn strip_archive_root(name: &str) -> &str {
    if name == ARCHIVE_ROOT {
        return "";
    }
    name.strip_prefix(ARCHIVE_ROOT)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(name)
}

struct EntryWriter<'a> {
    dest: &'a Path,
    made_dirs: HashSet<PathBuf>,
}

impl<'a> EntryWriter<'a> {
    fn new(dest: &'a Path) -> Self {
        Self {
            dest,
            made_dirs: HashSet::new(),
        }
    }

    fn target(&self, name: &str) -> Result<PathBuf, CoreError> {
        if !valid_rel_path(name) {
            return Err(CoreError::UnsafeEntry {
                name: name.to_string(),
            });
        }

        let mut out = self.dest.to_path_buf();
        for segment in strip_archive_root(name)
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
        {
            out.push(segment);
        }
        Ok(out)
    }

    fn make_dir(&mut self, dir: &Path) -> Result<(), CoreError> {
        if self.made_dirs.contains(dir) {
            return Ok(());
        }

        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder
            .create(dir)
            .map_err(|error| CoreError::io_with_path("failed to create directory", dir, error))?;

        self.made_dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn write_file(
        &mut self,
        path: &Path,
        contents: &mut dyn Read,
        expected: u64,
        mode: Option<u32>,
        modified: Option<SystemTime>,
    ) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            self.make_dir(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode.map_or(DEFAULT_FILE_MODE, |mode| mode & 0o777));
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options
            .open(path)
            .map_err(|error| CoreError::io_with_path("failed to create file", path, error))?;
        let written = std::io::copy(contents, &mut file)
            .map_err(|error| CoreError::io_with_path("error writing to", path, error))?;

        if written != expected {
            return Err(CoreError::ShortWrite {
                path: path.to_path_buf(),
                written,
                expected,
            });
        }

        if let Some(modified) = modified {
            restore_mtime(&file, path, modified);
        }
        Ok(())
    }
}

fn restore_mtime(file: &File, path: &Path, modified: SystemTime) {
    if let Err(error) = file.set_modified(modified) {
        warn!("error changing modtime of {}: {error}", path.display());
    }
}

fn unpack_tar_gz(archive_path: &Path, writer: &mut EntryWriter<'_>) -> Result<(), CoreError> {
    let file = File::open(archive_path)
        .map_err(|error| CoreError::io_with_path("failed to open archive", archive_path, error))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let entries = archive.entries().map_err(|error| {
        CoreError::io_with_path("failed to read tar archive", archive_path, error)
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|error| {
            CoreError::io_with_path("failed to read tar entry in", archive_path, error)
        })?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_pax_global_extensions() {
            continue;
        }

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let target = writer.target(&name)?;

        if entry_type.is_file() {
            let size = entry.size();
            let mode = entry.header().mode().ok();
            let modified = entry
                .header()
                .mtime()
                .ok()
                .filter(|secs| *secs > 0)
                .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
            writer.write_file(&target, &mut entry, size, mode, modified)?;
        } else if entry_type.is_dir() {
            writer.make_dir(&target)?;
        } else {
            return Err(CoreError::UnsupportedEntry {
                name,
                kind: format!("{entry_type:?}"),
            });
        }
    }

    Ok(())
}

fn unpack_zip(archive_path: &Path, writer: &mut EntryWriter<'_>) -> Result<(), CoreError> {
    let file = File::open(archive_path)
        .map_err(|error| CoreError::io_with_path("failed to open archive", archive_path, error))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|error| CoreError::zip("failed to read zip archive", archive_path, error))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| CoreError::zip("failed to read zip entry in", archive_path, error))?;
        let name = entry.name().to_string();
        let target = writer.target(&name)?;

        if entry.is_dir() {
            writer.make_dir(&target)?;
        } else if entry.is_symlink() {
            return Err(CoreError::UnsupportedEntry {
                name,
                kind: "Symlink".to_string(),
            });
        } else {
            let size = entry.size();
            let mode = entry.unix_mode();
            writer.write_file(&target, &mut entry, size, mode, None)?;
        }
    }

    Ok(())
}
