use std::path::{Path, PathBuf};

const CURRENT_LINK: &str = "current";
const TIP_DIR: &str = "gotip";
const LOG_FILE: &str = "goup.log";

/// Filesystem layout under the goup root.
///
/// ```text
/// <root>/
///   go1.22.4/              one directory per installed version
///     .unpacked-success    completion marker
///   gotip/                 source checkout for `install tip`
///   current -> go1.22.4    activation symlink
///   goup.log
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoupPaths {
    pub root: PathBuf,
}

impl GoupPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for an installed version. `version` is used as-is, callers
    /// normalize it to the `go` prefixed form first.
    #[must_use]
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    #[must_use]
    pub fn current_link(&self) -> PathBuf {
        self.root.join(CURRENT_LINK)
    }

    #[must_use]
    pub fn tip_dir(&self) -> PathBuf {
        self.version_dir(TIP_DIR)
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Ensure the root directory exists on disk.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn ensure_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::GoupPaths;

    #[test]
    fn layout_is_rooted_under_home() {
        let paths = GoupPaths::new("/home/gopher/.go");

        assert_eq!(
            paths.version_dir("go1.22.4"),
            Path::new("/home/gopher/.go/go1.22.4")
        );
        assert_eq!(paths.current_link(), Path::new("/home/gopher/.go/current"));
        assert_eq!(paths.tip_dir(), Path::new("/home/gopher/.go/gotip"));
        assert_eq!(paths.log_file(), Path::new("/home/gopher/.go/goup.log"));
    }

    #[test]
    fn ensure_root_creates_missing_directories() {
        let temp = tempfile_root();
        let paths = GoupPaths::new(temp.join("nested").join(".go"));

        paths.ensure_root().expect("root should be created");
        paths.ensure_root().expect("second call should be a no-op");

        assert!(paths.root().is_dir());
        let _ = std::fs::remove_dir_all(temp);
    }

    fn tempfile_root() -> std::path::PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "goup-platform-paths-test-{}-{nonce}",
            std::process::id()
        ))
    }
}
