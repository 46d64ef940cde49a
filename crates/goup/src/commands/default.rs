use goup_core::activate;
use goup_platform::GoupConfig;

use crate::error::CliError;

pub fn run(config: &GoupConfig, version: &str) -> Result<(), CliError> {
    activate(&config.paths, version)?;
    Ok(())
}
