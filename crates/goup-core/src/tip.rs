use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use goup_platform::GoupConfig;
use log::{debug, info, warn};
use regex::Regex;

use crate::error::CoreError;
use crate::process::{CommandSpec, ProcessRunner};
use crate::store::ensure_dir;

const GIT: &str = "git";
const UPSTREAM_REMOTE: &str = "upstream";

/// Yes/no question put to the user before running untrusted code.
pub trait Confirm: Send + Sync {
    /// # Errors
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, prompt: &str) -> Result<bool, CoreError>;
}

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes`
/// declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, CoreError> {
        let stdin_path = Path::new("<stdin>");
        let mut stderr = std::io::stderr();
        write!(stderr, "{prompt} [y/N] ")
            .and_then(|()| stderr.flush())
            .map_err(|error| CoreError::io_with_path("failed to prompt on", stdin_path, error))?;

        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|error| CoreError::io_with_path("failed to read answer from", stdin_path, error))?;

        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// A Gerrit change ref selected for a CL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSetRef {
    pub reference: String,
    pub patch_set: u32,
}

/// Pick the newest patch-set of `cl` from `git ls-remote` output.
///
/// Refs look like `refs/changes/<shard>/<cl>/<patch-set>`; non-numeric
/// entries such as `meta` are ignored and on equal numbers the later line
/// wins.
///
/// # Errors
/// Returns [`CoreError::InvalidChangeList`] for a non-numeric CL and
/// [`CoreError::ClNotFound`] when no patch-set ref is listed.
pub fn resolve_patch_set(ls_remote: &str, cl: &str) -> Result<PatchSetRef, CoreError> {
    let invalid = || CoreError::InvalidChangeList { cl: cl.to_string() };
    if cl.is_empty() || !cl.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let pattern = Regex::new(&format!(r"refs/changes/\d\d/{cl}/(\d+)")).map_err(|_| invalid())?;
    let mut best: Option<PatchSetRef> = None;

    for captures in ls_remote.lines().filter_map(|line| pattern.captures(line)) {
        let Some(patch_set) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        if best.as_ref().is_none_or(|current| patch_set >= current.patch_set) {
            best = Some(PatchSetRef {
                reference: captures[0].to_string(),
                patch_set,
            });
        }
    }

    best.ok_or_else(|| CoreError::ClNotFound { cl: cl.to_string() })
}

fn make_script(go_os: &str) -> &'static str {
    match go_os {
        "windows" => "make.bat",
        "plan9" => "make.rc",
        _ => "make.bash",
    }
}

/// Builds Go from a persistent checkout in `<root>/gotip`, either at the
/// head of the canonical repository or at a pending CL.
pub struct SourceBuild<'a> {
    config: &'a GoupConfig,
    runner: &'a dyn ProcessRunner,
    confirm: &'a dyn Confirm,
}

impl<'a> SourceBuild<'a> {
    #[must_use]
    pub fn new(
        config: &'a GoupConfig,
        runner: &'a dyn ProcessRunner,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            config,
            runner,
            confirm,
        }
    }

    /// Sync and build the checkout, returning its directory.
    ///
    /// # Errors
    /// Fails on an invalid or unknown CL, a declined confirmation, or any
    /// failing git or build step.
    pub async fn install_tip(&self, cl: Option<&str>) -> Result<PathBuf, CoreError> {
        if let Some(cl) = cl
            && (cl.is_empty() || !cl.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(CoreError::InvalidChangeList { cl: cl.to_string() });
        }

        let dir = self.config.paths.tip_dir();
        self.init(&dir).await?;

        match cl {
            Some(cl) => self.fetch_change(&dir, cl).await?,
            None => {
                info!("Updating the go development tree...");
                self.git(&dir, "fetch source", ["fetch", "origin", "master"])
                    .await?;
            }
        }

        self.git(
            &dir,
            "checkout source",
            ["-c", "advice.detachedHead=false", "checkout", "FETCH_HEAD"],
        )
        .await?;
        self.clean(&dir).await?;
        self.build(&dir).await?;

        info!("Built Go from source in {}", dir.display());
        Ok(dir)
    }

    async fn init(&self, dir: &Path) -> Result<(), CoreError> {
        if dir.join(".git").exists() {
            debug!("Reusing source checkout at {}", dir.display());
            return Ok(());
        }

        info!("Cloning Go source into {}", dir.display());
        ensure_dir(dir)?;

        let result = self.clone_checkout(dir).await;
        if result.is_err()
            && let Err(error) = std::fs::remove_dir_all(dir)
        {
            warn!("failed to clean up {}: {error}", dir.display());
        }
        result
    }

    async fn clone_checkout(&self, dir: &Path) -> Result<(), CoreError> {
        let clone = CommandSpec::new(GIT).args([
            "clone".to_string(),
            "--depth=1".to_string(),
            self.config.source_git_url.clone(),
            dir.to_string_lossy().into_owned(),
        ]);
        self.runner
            .run(&clone)
            .await
            .map_err(|source| CoreError::step("clone Go source", source))?;

        self.git(
            dir,
            "add upstream remote",
            [
                "remote",
                "add",
                UPSTREAM_REMOTE,
                self.config.upstream_git_url.as_str(),
            ],
        )
        .await
    }

    async fn fetch_change(&self, dir: &Path, cl: &str) -> Result<(), CoreError> {
        let prompt = format!("This will download and execute code from go.dev/cl/{cl}, continue");
        if !self.config.assume_yes && !self.confirm.confirm(&prompt)? {
            return Err(CoreError::Interrupted);
        }

        info!("Fetching CL {cl}...");
        let ls_remote = CommandSpec::new(GIT)
            .args(["ls-remote", UPSTREAM_REMOTE])
            .current_dir(dir);
        let refs = self
            .runner
            .output(&ls_remote)
            .await
            .map_err(|source| CoreError::step("list upstream refs", source))?;

        let patch_set = resolve_patch_set(&refs, cl)?;
        debug!("CL {cl} resolved to {}", patch_set.reference);

        self.git(
            dir,
            "fetch change",
            ["fetch", UPSTREAM_REMOTE, patch_set.reference.as_str()],
        )
        .await
    }

    async fn clean(&self, dir: &Path) -> Result<(), CoreError> {
        if self.config.assume_yes {
            debug!("Skipping interactive clean");
        } else {
            self.git(dir, "clean working tree", ["clean", "-i", "-d"])
                .await?;
        }
        self.git(dir, "clean ignored files", ["clean", "-q", "-f", "-d", "-X"])
            .await
    }

    async fn build(&self, dir: &Path) -> Result<(), CoreError> {
        let src = dir.join("src");
        let script = src.join(make_script(&self.config.go_os));
        let mut make = CommandSpec::new(script.to_string_lossy()).current_dir(&src);

        if self.config.go_os == "windows" {
            let goroot = self
                .runner
                .output(&CommandSpec::new("go").args(["env", "GOROOT"]))
                .await
                .map_err(|source| CoreError::step("find bootstrap Go", source))?;
            make = make.env("GOROOT_BOOTSTRAP", goroot.trim());
        }

        info!("Building Go in {}", src.display());
        self.runner
            .run(&make)
            .await
            .map_err(|source| CoreError::step("build Go", source))
    }

    async fn git<I, S>(&self, dir: &Path, step: &'static str, args: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = S> + Send,
        S: Into<String>,
    {
        let command = CommandSpec::new(GIT).args(args).current_dir(dir);
        self.runner
            .run(&command)
            .await
            .map_err(|source| CoreError::step(step, source))
    }
}
