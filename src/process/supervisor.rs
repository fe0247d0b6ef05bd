use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
#[cfg(unix)]
use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handle to a background process started by [`super::ProcessRunner::launch`]
#[derive(Debug)]
pub struct LaunchedProcess {
    command: String,
    log_path: PathBuf,
    child: Option<Child>,
}

impl LaunchedProcess {
    /// `child` is `None` when nothing was actually spawned (e.g., under test)
    pub fn new(command: String, log_path: PathBuf, child: Option<Child>) -> Self {
        Self {
            command,
            log_path,
            child,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// Wait for the process to exit. `None` when there is no child to wait on.
    pub async fn wait(self) -> io::Result<Option<ExitStatus>> {
        match self.child {
            Some(mut child) => child.wait().await.map(Some),
            None => Ok(None),
        }
    }

    /// Wait for exit, killing the process if `cancel` fires first
    pub async fn wait_or_kill(self, cancel: CancellationToken) -> io::Result<Option<ExitStatus>> {
        let Some(mut child) = self.child else {
            return Ok(None);
        };

        tokio::select! {
            status = child.wait() => status.map(Some),
            _ = cancel.cancelled() => {
                debug!("Stopping `{}`", self.command);
                terminate(&mut child).await.map(Some)
            }
        }
    }
}

/// How long a process group gets between SIGTERM and SIGKILL
#[cfg(unix)]
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Stop the child together with everything it started.
///
/// Launched commands lead their own process group, so the group id is the
/// child's pid. Package manager scripts fork dev servers that would otherwise
/// outlive the wrapper.
#[cfg(unix)]
async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let group = Pid::from_raw(pid as i32);

    signal_group(group, Signal::SIGTERM);
    let status = match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            debug!("Process group {pid} ignored SIGTERM, sending SIGKILL");
            signal_group(group, Signal::SIGKILL);
            child.wait().await
        }
    };
    // The leader can exit before members that trap SIGTERM
    signal_group(group, Signal::SIGKILL);
    status
}

#[cfg(unix)]
fn signal_group(group: nix::unistd::Pid, signal: nix::sys::signal::Signal) {
    match nix::sys::signal::killpg(group, signal) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!("Failed to send {signal} to process group {group}: {e}"),
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    child.start_kill()?;
    child.wait().await
}

/// Keeps every process the repository runner launched
#[derive(Debug, Default)]
pub struct Supervisor {
    processes: Vec<LaunchedProcess>,
}

/// How a supervised process ended
#[derive(Debug)]
pub struct Exited {
    pub command: String,
    pub log_path: PathBuf,
    pub status: io::Result<Option<ExitStatus>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, process: LaunchedProcess) {
        self.processes.push(process);
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn processes(&self) -> &[LaunchedProcess] {
        &self.processes
    }

    /// Let every process keep running after devrun exits
    pub fn detach(self) {
        for process in self.processes {
            info!(
                "Leaving `{}` running (pid {}), output in {}",
                process.command,
                process
                    .pid()
                    .map_or_else(|| "unknown".to_string(), |pid| pid.to_string()),
                process.log_path.display()
            );
        }
    }

    /// Wait for every process; once `cancel` fires the remaining ones are killed
    pub async fn wait_all(self, cancel: CancellationToken) -> Vec<Exited> {
        let mut set = JoinSet::new();
        for process in self.processes {
            let cancel = cancel.clone();
            set.spawn(async move {
                let command = process.command.clone();
                let log_path = process.log_path.clone();
                let status = process.wait_or_kill(cancel).await;
                Exited {
                    command,
                    log_path,
                    status,
                }
            });
        }

        let mut exited = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(done) => exited.push(done),
                Err(e) => warn!("Supervisor task failed: {e}"),
            }
        }
        exited
    }
}
