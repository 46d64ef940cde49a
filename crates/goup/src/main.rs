mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use goup_platform::GoupConfig;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::debug!("Command failed: {error:?}");
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = GoupConfig::from_env()?;
    if cli.yes {
        config = config.with_assume_yes(true);
    }
    logging::init_logging(&config.paths, cli.verbose);

    match cli.command {
        Command::Install(args) => commands::install::run(&config, args).await,
        Command::Default { version } => commands::default::run(&config, &version),
        Command::Ls => commands::ls::run(&config),
        Command::LsVer { filter } => commands::ls_ver::run(&config, filter.as_deref()).await,
        Command::Search { regex } => commands::search::run(&config, regex.as_deref()).await,
    }
}
