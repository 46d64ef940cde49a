use goup_core::{CommandSpec, ProcessRunner, SystemRunner};
use goup_platform::GoupConfig;
use regex::Regex;

use crate::error::CliError;

pub async fn run(config: &GoupConfig, pattern: Option<&str>) -> Result<(), CliError> {
    let command = CommandSpec::new("git").args([
        "ls-remote",
        "--sort=version:refname",
        "--tags",
        config.source_git_url.as_str(),
    ]);
    let refs = SystemRunner.output(&command).await?;

    for version in tagged_versions(&refs, pattern)? {
        println!("{version}");
    }
    Ok(())
}

/// Go versions tagged in `git ls-remote --tags` output whose version
/// matches `pattern` anywhere. Peeled `^{}` refs are skipped.
fn tagged_versions(refs: &str, pattern: Option<&str>) -> Result<Vec<String>, CliError> {
    let filter = match pattern.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pattern) => format!(".*{pattern}.*"),
        None => ".+".to_string(),
    };
    let tag = Regex::new(&format!("refs/tags/go({filter})")).map_err(|source| {
        CliError::InvalidPattern {
            pattern: pattern.unwrap_or_default().to_string(),
            source,
        }
    })?;

    let versions: Vec<String> = refs
        .lines()
        .filter(|line| !line.ends_with("^{}"))
        .filter_map(|line| tag.captures(line))
        .map(|captures| captures[1].to_string())
        .collect();

    if versions.is_empty() {
        return Err(CliError::NoVersionFound);
    }
    Ok(versions)
}
