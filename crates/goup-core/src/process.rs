use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, error, info, trace};
use tokio::process::Command;

use crate::error::ProcessError;

/// An external program invocation, described as data so tests can record
/// and inspect it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined by spaces, for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run with inherited stdio, failing on a non-zero exit.
    async fn run(&self, command: &CommandSpec) -> Result<(), ProcessError>;

    /// Run with captured output and return stdout.
    async fn output(&self, command: &CommandSpec) -> Result<String, ProcessError>;
}

/// [`ProcessRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn resolve_program(program: &str) -> Result<PathBuf, ProcessError> {
        let path = Path::new(program);
        if path.components().count() > 1 {
            return Ok(path.to_path_buf());
        }

        which::which(program).map_err(|_| ProcessError::NotFound {
            program: program.to_string(),
        })
    }

    fn build_command(spec: &CommandSpec) -> Result<Command, ProcessError> {
        let program = Self::resolve_program(&spec.program)?;
        debug!("Building command: {} {}", program.display(), spec.args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(&spec.args);

        if let Some(dir) = &spec.dir {
            debug!("Working directory: {}", dir.display());
            cmd.current_dir(dir);
        }

        for (key, value) in &spec.envs {
            debug!("Setting {key}={value}");
            cmd.env(key, value);
        }

        Ok(cmd)
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> ProcessError {
        ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<(), ProcessError> {
        info!("Running: {}", command.command_line());

        let status = Self::build_command(command)?
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| Self::spawn_error(command, source))?;

        debug!("{} exit status: {status:?}", command.program);

        if status.success() {
            Ok(())
        } else {
            error!("Command failed: {}", command.command_line());
            Err(ProcessError::Failed {
                program: command.program.clone(),
                status: status.to_string(),
                stderr: String::new(),
            })
        }
    }

    async fn output(&self, command: &CommandSpec) -> Result<String, ProcessError> {
        debug!("Capturing: {}", command.command_line());

        let output = Self::build_command(command)?
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Self::spawn_error(command, source))?;

        debug!("{} exit status: {:?}", command.program, output.status);
        trace!("{} stdout: {}", command.program, String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            debug!("{} succeeded, output: {} bytes", command.program, stdout.len());
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            error!("Command failed: {}, stderr='{stderr}'", command.command_line());
            Err(ProcessError::Failed {
                program: command.program.clone(),
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}
