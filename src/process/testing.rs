//! In-memory [`ProcessRunner`] that records calls instead of spawning

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Mutex;

use super::{CommandSpec, LaunchedProcess, ProcessRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Status { command: String, cwd: Option<PathBuf> },
    Launch { command: String, log_path: PathBuf },
}

#[derive(Debug, Default)]
pub struct RecordingRunner {
    available: HashSet<String>,
    /// Commands (as displayed) that exit non-zero
    failing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingRunner {
    pub fn with_tools(tools: &[&str]) -> Self {
        Self {
            available: tools.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing(mut self, command: &str) -> Self {
        self.failing.insert(command.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn launches(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Launch { .. }))
            .collect()
    }
}

pub fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }
}

impl ProcessRunner for RecordingRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.available
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }

    async fn status(&self, command: &CommandSpec) -> io::Result<ExitStatus> {
        let rendered = command.to_string();
        let code = if self.failing.contains(&rendered) { 1 } else { 0 };
        self.calls.lock().unwrap().push(Call::Status {
            command: rendered,
            cwd: command.cwd.clone(),
        });
        Ok(exit_status(code))
    }

    fn launch(&self, command: &CommandSpec, log_path: &Path) -> io::Result<LaunchedProcess> {
        self.calls.lock().unwrap().push(Call::Launch {
            command: command.to_string(),
            log_path: log_path.to_path_buf(),
        });
        Ok(LaunchedProcess::new(
            command.to_string(),
            log_path.to_path_buf(),
            None,
        ))
    }
}
