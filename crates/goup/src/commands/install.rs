use goup_backend::{Release, ReleaseService};
use goup_core::{Installer, SourceBuild, StdinConfirm, SystemRunner, activate};
use goup_platform::GoupConfig;
use goup_release::{GoReleaseService, HttpDownloader, build_client};
use log::info;

use crate::cli::InstallArgs;
use crate::error::CliError;

const TIP: &str = "tip";

/// What `goup install` was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallTarget<'a> {
    /// Build from source, optionally at a pending change list.
    Tip(Option<&'a str>),
    /// A binary release: the latest, or the best match for a prefix.
    Release(Option<&'a str>),
}

/// A change list only makes sense for `tip`; anywhere else it is rejected
/// instead of being dropped.
fn install_target(args: &InstallArgs) -> Result<InstallTarget<'_>, CliError> {
    match (args.version.as_deref(), args.cl.as_deref()) {
        (Some(TIP), cl) => Ok(InstallTarget::Tip(cl)),
        (version, None) => Ok(InstallTarget::Release(version)),
        (version, Some(_)) => Err(CliError::UnexpectedChangeList {
            version: version.unwrap_or_default().to_string(),
        }),
    }
}

pub async fn run(config: &GoupConfig, args: InstallArgs) -> Result<(), CliError> {
    let target = install_target(&args)?;

    let mut config = config.clone();
    if let Some(host) = &args.host {
        config = config.with_go_host(host.clone());
    }

    let version = match target {
        InstallTarget::Tip(cl) => {
            let runner = SystemRunner;
            SourceBuild::new(&config, &runner, &StdinConfirm)
                .install_tip(cl)
                .await?;
            format!("go{TIP}")
        }
        InstallTarget::Release(requested) => {
            let client = build_client()?;
            let service = GoReleaseService::new(client.clone(), config.go_host.clone());
            let release = select_release(&service, requested).await?;
            info!("Installing {}", release.version);

            let downloader = HttpDownloader::new(client);
            Installer::new(&config, &downloader).install(&release).await?;
            release.version
        }
    };

    activate(&config.paths, &version)?;
    Ok(())
}

/// The latest release when nothing is requested, otherwise the oldest stable
/// release matching the prefix, falling back to the oldest pre-release.
async fn select_release(
    service: &dyn ReleaseService,
    requested: Option<&str>,
) -> Result<Release, CliError> {
    let Some(prefix) = requested else {
        return Ok(service.latest().await?);
    };

    let matches = service.filter(prefix).await?;
    let stable = matches.iter().position(|release| release.stable);
    let index = stable.unwrap_or(0);

    matches
        .into_iter()
        .nth(index)
        .ok_or(CliError::NoMatchedVersion)
}
