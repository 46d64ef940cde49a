use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use goup_backend::{Downloader, LogProgress, Release};
use goup_platform::GoupConfig;
use log::{debug, info, warn};
use reqwest::StatusCode;

use crate::error::CoreError;
use crate::extract::unpack_archive;
use crate::locate::archive_file;
use crate::store::{ensure_dir, is_installed, mark_installed};
use crate::verify::verify_sha256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyInstalled(PathBuf),
    Installed(PathBuf),
}

impl InstallOutcome {
    #[must_use]
    pub fn dir(&self) -> &Path {
        match self {
            Self::AlreadyInstalled(dir) | Self::Installed(dir) => dir,
        }
    }
}

/// Installs binary releases into `<root>/<version>`.
///
/// The pipeline is locate, probe, download, verify, extract and mark. It
/// never retries; retry policy belongs to the [`Downloader`].
pub struct Installer<'a> {
    config: &'a GoupConfig,
    downloader: &'a dyn Downloader,
}

impl<'a> Installer<'a> {
    #[must_use]
    pub fn new(config: &'a GoupConfig, downloader: &'a dyn Downloader) -> Self {
        Self { config, downloader }
    }

    /// # Errors
    /// Fails when the release has no archive for the configured platform,
    /// the server does not offer it, the download is incomplete or corrupt,
    /// or extraction fails.
    pub async fn install(&self, release: &Release) -> Result<InstallOutcome, CoreError> {
        let dir = self.config.paths.version_dir(&release.version);
        if is_installed(&dir) {
            debug!("{} already installed in {}", release.version, dir.display());
            return Ok(InstallOutcome::AlreadyInstalled(dir));
        }

        let file = archive_file(release, &self.config.go_os, &self.config.go_arch)?;
        let url = file.url(&self.config.go_host);
        let expected = self.probe(release, &url).await?;

        ensure_dir(&dir)?;
        let archive = dir.join(&file.filename);
        self.acquire(&url, &archive, expected).await?;

        if let Err(error) = verify_sha256(&archive, &file.sha256) {
            if matches!(error, CoreError::DigestMismatch { .. }) {
                discard(&archive);
            }
            return Err(error);
        }

        info!("Unpacking {} ...", archive.display());
        unpack_archive(&archive, &dir).map_err(|source| CoreError::Extract {
            archive: archive.clone(),
            source: Box::new(source),
        })?;

        mark_installed(&dir)?;
        info!("Success. {} installed in {}", release.version, dir.display());
        Ok(InstallOutcome::Installed(dir))
    }

    async fn probe(&self, release: &Release, url: &str) -> Result<u64, CoreError> {
        let head = self
            .downloader
            .head_size(url)
            .await
            .map_err(|source| CoreError::Probe {
                url: url.to_string(),
                source,
            })?;
        debug!("HEAD {url}: {} ({:?} bytes)", head.status, head.content_length);

        if head.status == StatusCode::NOT_FOUND {
            return Err(CoreError::NoBinaryRelease {
                version: release.version.clone(),
                os: self.config.go_os.clone(),
                arch: self.config.go_arch.clone(),
                url: url.to_string(),
            });
        }
        if head.status != StatusCode::OK {
            return Err(CoreError::UnexpectedStatus {
                url: url.to_string(),
                status: head.status,
            });
        }

        head.content_length
            .ok_or_else(|| CoreError::MissingContentLength {
                url: url.to_string(),
            })
    }

    async fn acquire(&self, url: &str, archive: &Path, expected: u64) -> Result<(), CoreError> {
        match std::fs::metadata(archive) {
            Ok(meta) if meta.len() == expected => {
                debug!("{} already downloaded, skipping", archive.display());
                return Ok(());
            }
            Ok(_) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(CoreError::io_with_path("failed to stat", archive, error)),
        }

        info!("Downloading {url} ...");
        let mut progress = LogProgress::new();
        self.downloader
            .download(url, archive, &mut progress)
            .await
            .map_err(|source| CoreError::Download {
                url: url.to_string(),
                source,
            })?;

        let actual = std::fs::metadata(archive)
            .map_err(|error| CoreError::io_with_path("failed to stat", archive, error))?
            .len();
        if actual != expected {
            return Err(CoreError::SizeMismatch {
                path: archive.to_path_buf(),
                actual,
                expected,
            });
        }
        Ok(())
    }
}

/// Remove an archive that failed verification so the size shortcut cannot
/// pick it up on the next run.
fn discard(archive: &Path) {
    match std::fs::remove_file(archive) {
        Ok(()) => debug!("Removed corrupt archive {}", archive.display()),
        Err(error) => warn!("Failed to remove {}: {error}", archive.display()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use goup_backend::{
        ArtifactFile, ArtifactKind, Downloader, HeadResponse, ProgressSink, Release, ServiceError,
    };
    use goup_platform::GoupConfig;
    use reqwest::StatusCode;

    use super::{InstallOutcome, Installer};
    use crate::error::{CoreError, ErrorClass};
    use crate::store::{INSTALLED_MARKER, ensure_dir, mark_installed};

    const PAYLOAD: &[u8] = b"abc";
    const PAYLOAD_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const FILENAME: &str = "go1.22.4.linux-amd64.tar.gz";

    struct MockDownloader {
        status: StatusCode,
        content_length: Option<u64>,
        body: Vec<u8>,
        heads: AtomicUsize,
        downloads: AtomicUsize,
    }

    impl MockDownloader {
        fn serving(body: &[u8]) -> Self {
            Self {
                status: StatusCode::OK,
                content_length: Some(body.len() as u64),
                body: body.to_vec(),
                heads: AtomicUsize::new(0),
                downloads: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> (usize, usize) {
            (
                self.heads.load(Ordering::SeqCst),
                self.downloads.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl Downloader for MockDownloader {
        async fn head_size(&self, _url: &str) -> Result<HeadResponse, ServiceError> {
            self.heads.fetch_add(1, Ordering::SeqCst);
            Ok(HeadResponse {
                status: self.status,
                content_length: self.content_length,
            })
        }

        async fn download(
            &self,
            _url: &str,
            dest: &Path,
            progress: &mut dyn ProgressSink,
        ) -> Result<u64, ServiceError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            std::fs::write(dest, &self.body).map_err(|source| ServiceError::Io {
                path: dest.display().to_string(),
                source,
            })?;
            let written = self.body.len() as u64;
            progress.finish(written, self.content_length);
            Ok(written)
        }
    }

    fn release(sha256: &str) -> Release {
        Release {
            version: "go1.22.4".to_string(),
            stable: true,
            files: vec![ArtifactFile {
                filename: FILENAME.to_string(),
                os: "linux".to_string(),
                arch: "amd64".to_string(),
                version: "go1.22.4".to_string(),
                sha256: sha256.to_string(),
                size: PAYLOAD.len() as u64,
                kind: ArtifactKind::Archive,
            }],
        }
    }

    fn config(root: &Path, os: &str) -> GoupConfig {
        GoupConfig::from_lookup(|key| {
            (key == "GOUP_HOME").then(|| root.to_string_lossy().into_owned())
        })
        .expect("config should resolve")
        .with_go_host("go.dev")
        .with_target(os, "amd64")
    }

    #[tokio::test]
    async fn installed_version_needs_no_network() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let dir = config.paths.version_dir("go1.22.4");
        ensure_dir(&dir).expect("dir");
        mark_installed(&dir).expect("marker");
        let downloader = MockDownloader::serving(PAYLOAD);

        let outcome = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await
            .expect("install should short-circuit");

        assert_eq!(outcome, InstallOutcome::AlreadyInstalled(dir));
        assert_eq!(downloader.calls(), (0, 0));
    }

    #[tokio::test]
    async fn missing_artifact_fails_without_writes() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "darwin");
        let downloader = MockDownloader::serving(PAYLOAD);

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        assert!(matches!(result, Err(CoreError::ArchiveNotFound { .. })));
        assert_eq!(downloader.calls(), (0, 0));
        assert!(!config.paths.version_dir("go1.22.4").exists());
    }

    #[tokio::test]
    async fn not_found_probe_is_no_binary_release() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let downloader = MockDownloader {
            status: StatusCode::NOT_FOUND,
            ..MockDownloader::serving(PAYLOAD)
        };

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        match result {
            Err(error @ CoreError::NoBinaryRelease { .. }) => {
                assert_eq!(error.class(), ErrorClass::NotFound);
                assert!(error.to_string().contains(&format!("https://go.dev/dl/{FILENAME}")));
            }
            other => panic!("expected NoBinaryRelease, got {other:?}"),
        }
        assert_eq!(downloader.calls(), (1, 0));
        assert!(!config.paths.version_dir("go1.22.4").exists());
    }

    #[tokio::test]
    async fn unexpected_status_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let downloader = MockDownloader {
            status: StatusCode::SERVICE_UNAVAILABLE,
            ..MockDownloader::serving(PAYLOAD)
        };

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        match result {
            Err(error @ CoreError::UnexpectedStatus { .. }) => {
                assert!(error.to_string().contains("503"));
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_content_length_fails_before_writes() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let downloader = MockDownloader {
            content_length: None,
            ..MockDownloader::serving(PAYLOAD)
        };

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        assert!(matches!(result, Err(CoreError::MissingContentLength { .. })));
        assert!(!config.paths.version_dir("go1.22.4").exists());
    }

    #[tokio::test]
    async fn short_download_is_size_mismatch() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let downloader = MockDownloader {
            content_length: Some(10),
            ..MockDownloader::serving(PAYLOAD)
        };

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        match result {
            Err(error @ CoreError::SizeMismatch { .. }) => {
                assert_eq!(error.class(), ErrorClass::Integrity);
                assert!(error.to_string().contains("size 3 doesn't match server size 10"));
            }
            other => panic!("expected SizeMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrupt_download_is_not_marked() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let downloader = MockDownloader::serving(b"xyz");

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        assert!(matches!(result, Err(CoreError::DigestMismatch { .. })));
        let dir = config.paths.version_dir("go1.22.4");
        assert!(!dir.join(INSTALLED_MARKER).exists());
        assert!(!dir.join(FILENAME).exists(), "corrupt archive should be removed");
    }

    #[tokio::test]
    async fn archive_of_probed_size_is_not_downloaded_again() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let dir = config.paths.version_dir("go1.22.4");
        ensure_dir(&dir).expect("dir");
        std::fs::write(dir.join(FILENAME), b"xyz").expect("stale archive");
        let downloader = MockDownloader::serving(PAYLOAD);

        let result = Installer::new(&config, &downloader)
            .install(&release(PAYLOAD_SHA256))
            .await;

        assert_eq!(downloader.calls(), (1, 0));
        assert!(
            matches!(result, Err(CoreError::DigestMismatch { .. })),
            "the reused file must still be verified"
        );
        assert!(!dir.join(FILENAME).exists());
    }

    #[tokio::test]
    async fn rejected_archive_is_downloaded_again_next_run() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = config(temp.path(), "linux");
        let dir = config.paths.version_dir("go1.22.4");
        ensure_dir(&dir).expect("dir");
        std::fs::write(dir.join(FILENAME), b"xyz").expect("stale archive");
        let downloader = MockDownloader::serving(PAYLOAD);
        let installer = Installer::new(&config, &downloader);

        let first = installer.install(&release(PAYLOAD_SHA256)).await;
        assert!(matches!(first, Err(CoreError::DigestMismatch { .. })));

        // The served payload verifies but is not a real archive, so the
        // second run stops at extraction.
        let second = installer.install(&release(PAYLOAD_SHA256)).await;

        assert_eq!(downloader.calls(), (2, 1));
        assert!(matches!(second, Err(CoreError::Extract { .. })));
        assert_eq!(
            std::fs::read(dir.join(FILENAME)).expect("fresh archive"),
            PAYLOAD
        );
    }
}
