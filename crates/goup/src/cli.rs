use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "goup", version, about = "Elegant Go version manager")]
pub struct Cli {
    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to every prompt and skip interactive cleanup
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install Go with a version
    ///
    /// Without a version the latest release is installed. `tip` builds Go
    /// from source, optionally at a change list (CL) number.
    Install(InstallArgs),

    /// Set the default Go version
    #[command(alias = "set")]
    Default {
        /// Version to activate, with or without the `go` prefix
        version: String,
    },

    /// List installed Go versions
    Ls,

    /// List Go versions available for install
    #[command(name = "ls-ver")]
    LsVer {
        /// Only show versions containing this text
        filter: Option<String>,
    },

    /// Search Go versions tagged in the source repository
    Search {
        /// Only show versions matching this regular expression
        regex: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Version or version prefix, or `tip`
    pub version: Option<String>,

    /// Change list number, only with `tip`
    pub cl: Option<String>,

    /// Host to download Go from
    #[arg(long)]
    pub host: Option<String>,
}
