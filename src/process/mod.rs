//! External process execution
//!
//! Everything that touches another binary goes through [`ProcessRunner`], so
//! the runners can be exercised without spawning anything:
//! - locating a binary on PATH
//! - running a command to completion
//! - launching a command in the background with output sent to a log file

mod supervisor;
#[cfg(test)]
pub(crate) mod testing;

pub use supervisor::{LaunchedProcess, Supervisor};

use std::fmt;
use std::fs::File;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use crate::error::{DevrunError, Result};

/// A command line plus the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Indexes into `args` that must never be printed
    secret_args: Vec<usize>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            secret_args: Vec::new(),
        }
    }

    /// Build from a whitespace-separated command string such as `npm ci`
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument that is shown as `****` when displayed
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for (index, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&index) {
                write!(f, " ****")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Seam between the runners and the operating system
pub trait ProcessRunner: Send + Sync + 'static {
    /// Full path of `program` if it can be found on PATH
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion with inherited stdout/stderr
    fn status(&self, command: &CommandSpec) -> impl Future<Output = io::Result<ExitStatus>> + Send;

    /// Start in the background with stdout and stderr written to `log_path`
    fn launch(&self, command: &CommandSpec, log_path: &Path) -> io::Result<LaunchedProcess>;
}

/// Run `command` to completion and turn a non-zero exit into an error
pub async fn run_checked<R: ProcessRunner>(runner: &R, command: &CommandSpec) -> Result<()> {
    let status = runner
        .status(command)
        .await
        .map_err(|source| DevrunError::Spawn {
            command: command.to_string(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(DevrunError::CommandFailed {
            command: command.to_string(),
            status,
        })
    }
}

/// Runs real processes through `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl ProcessRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn status(&self, spec: &CommandSpec) -> io::Result<ExitStatus> {
        Self::command(spec).status().await
    }

    fn launch(&self, spec: &CommandSpec, log_path: &Path) -> io::Result<LaunchedProcess> {
        if let Some(parent) = log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let log = File::create(log_path)?;

        let mut command = Self::command(spec);
        command
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log));

        // Own process group: a Ctrl-C aimed at devrun must not reach the launched script
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn()?;
        Ok(LaunchedProcess::new(spec.to_string(), log_path.to_path_buf(), Some(child)))
    }
}
