use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Prefix every Go release version carries (`go1.22.4`, `gotip`).
pub const VERSION_PREFIX: &str = "go";

/// Normalize a user supplied version to the canonical `go<version>` form.
#[must_use]
pub fn canonical_version(version: &str) -> String {
    let version = version.trim();
    if version.starts_with(VERSION_PREFIX) {
        version.to_string()
    } else {
        format!("{VERSION_PREFIX}{version}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Archive,
    Installer,
    Source,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive => write!(f, "archive"),
            Self::Installer => write!(f, "installer"),
            Self::Source => write!(f, "source"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub filename: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
    pub version: String,
    pub sha256: String,
    pub size: u64,
    pub kind: ArtifactKind,
}

impl ArtifactFile {
    #[must_use]
    pub fn url(&self, host: &str) -> String {
        format!("https://{host}/dl/{}", self.filename)
    }
}

/// A published Go release as described by the `/dl/?mode=json` index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    pub stable: bool,
    #[serde(default)]
    pub files: Vec<ArtifactFile>,
}

/// A version directory found under the goup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: String,
    pub dir: PathBuf,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_SAMPLE: &str = r#"[
      {
        "version": "go1.22.4",
        "stable": true,
        "files": [
          {
            "filename": "go1.22.4.src.tar.gz",
            "os": "",
            "arch": "",
            "version": "go1.22.4",
            "sha256": "fed720678e728a7ca30ba8d1ded1caafe27d16028fab0232b8ba8e22008fb784",
            "size": 27554100,
            "kind": "source"
          },
          {
            "filename": "go1.22.4.linux-amd64.tar.gz",
            "os": "linux",
            "arch": "amd64",
            "version": "go1.22.4",
            "sha256": "ba79d4526102575196273416239cca418a651e049c2b099f3159db85e7bade7d",
            "size": 68958945,
            "kind": "archive"
          },
          {
            "filename": "go1.22.4.windows-amd64.msi",
            "os": "windows",
            "arch": "amd64",
            "version": "go1.22.4",
            "sha256": "3c21105d7b584759b6e266383b777caf6e87142d304a10b539dbc66ab482bb5f",
            "size": 60936192,
            "kind": "installer"
          }
        ]
      }
    ]"#;

    #[test]
    fn release_index_deserializes() {
        let releases: Vec<Release> =
            serde_json::from_str(INDEX_SAMPLE).expect("sample index should parse");

        assert_eq!(releases.len(), 1);
        let release = &releases[0];
        assert_eq!(release.version, "go1.22.4");
        assert!(release.stable);
        assert_eq!(release.files.len(), 3);
        assert_eq!(release.files[0].kind, ArtifactKind::Source);
        assert_eq!(release.files[1].kind, ArtifactKind::Archive);
        assert_eq!(release.files[1].size, 68_958_945);
        assert_eq!(release.files[2].kind, ArtifactKind::Installer);
    }

    #[test]
    fn unknown_kind_does_not_break_parsing() {
        let file: ArtifactFile = serde_json::from_str(
            r#"{"filename":"x","os":"linux","arch":"amd64","version":"go1","sha256":"00","size":1,"kind":"sbom"}"#,
        )
        .expect("unknown kinds should still parse");

        assert_eq!(file.kind, ArtifactKind::Unknown);
    }

    #[test]
    fn artifact_url_uses_dl_path() {
        let file = ArtifactFile {
            filename: "go1.22.4.linux-amd64.tar.gz".to_string(),
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            version: "go1.22.4".to_string(),
            sha256: String::new(),
            size: 0,
            kind: ArtifactKind::Archive,
        };

        assert_eq!(
            file.url("golang.google.cn"),
            "https://golang.google.cn/dl/go1.22.4.linux-amd64.tar.gz"
        );
    }

    #[test]
    fn canonical_version_adds_prefix_once() {
        assert_eq!(canonical_version("1.22.4"), "go1.22.4");
        assert_eq!(canonical_version("go1.22.4"), "go1.22.4");
        assert_eq!(canonical_version(" 1.21rc2 "), "go1.21rc2");
        assert_eq!(canonical_version("gotip"), "gotip");
    }
}
