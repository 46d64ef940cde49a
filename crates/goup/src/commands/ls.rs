use goup_backend::InstalledVersion;
use goup_core::list_installed;
use goup_platform::GoupConfig;

use crate::error::CliError;

pub fn run(config: &GoupConfig) -> Result<(), CliError> {
    for line in render(&list_installed(config)?) {
        println!("{line}");
    }
    Ok(())
}

fn render(installed: &[InstalledVersion]) -> Vec<String> {
    installed
        .iter()
        .map(|version| {
            let marker = if version.is_active { '*' } else { ' ' };
            format!("{marker} {}", version.version)
        })
        .collect()
}
