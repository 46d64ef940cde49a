use goup_backend::{Release, ReleaseService, VERSION_PREFIX};
use goup_platform::GoupConfig;
use goup_release::{GoReleaseService, build_client};

use crate::error::CliError;

pub async fn run(config: &GoupConfig, filter: Option<&str>) -> Result<(), CliError> {
    let service = GoReleaseService::new(build_client()?, config.go_host.clone());
    let releases = service.list(true).await?;

    for version in matching_versions(&releases, filter.unwrap_or_default()) {
        println!("{version}");
    }
    Ok(())
}

/// Versions containing `filter`, without the `go` prefix. An empty filter
/// keeps everything.
fn matching_versions<'a>(releases: &'a [Release], filter: &str) -> Vec<&'a str> {
    let filter = filter.trim();
    releases
        .iter()
        .filter(|release| release.version.contains(filter))
        .map(|release| {
            release
                .version
                .strip_prefix(VERSION_PREFIX)
                .unwrap_or(&release.version)
        })
        .collect()
}
