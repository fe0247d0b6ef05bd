use std::fmt;
use std::path::PathBuf;

use crate::process::{LaunchedProcess, Supervisor};

/// How one directory's pipeline ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirOutcome {
    /// Run script started in the background
    Launched { log_path: PathBuf },
    /// Dependencies installed, nothing launched
    Installed,
    /// Commands printed only
    DryRun,
    /// Not a recognized project directory
    Skipped(String),
    Failed(String),
}

impl fmt::Display for DirOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirOutcome::Launched { log_path } => write!(f, "launched, log: {}", log_path.display()),
            DirOutcome::Installed => write!(f, "installed"),
            DirOutcome::DryRun => write!(f, "dry run"),
            DirOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            DirOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug)]
pub struct DirReport {
    pub dir: PathBuf,
    pub outcome: DirOutcome,
    pub process: Option<LaunchedProcess>,
}

impl DirReport {
    pub fn new(dir: PathBuf, outcome: DirOutcome) -> Self {
        Self {
            dir,
            outcome,
            process: None,
        }
    }

    pub fn failed(dir: PathBuf, reason: String) -> Self {
        Self::new(dir, DirOutcome::Failed(reason))
    }

    pub fn launched(dir: PathBuf, process: LaunchedProcess) -> Self {
        Self {
            dir,
            outcome: DirOutcome::Launched {
                log_path: process.log_path().to_path_buf(),
            },
            process: Some(process),
        }
    }
}

/// All directory reports from one run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<DirReport>,
}

impl RunSummary {
    pub fn new(reports: Vec<DirReport>) -> Self {
        Self { reports }
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, DirOutcome::Failed(_)))
    }

    pub fn launched(&self) -> usize {
        self.count(|outcome| matches!(outcome, DirOutcome::Launched { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Move every launched process handle into a supervisor
    pub fn take_processes(&mut self) -> Supervisor {
        let mut supervisor = Supervisor::new();
        for report in &mut self.reports {
            if let Some(process) = report.process.take() {
                supervisor.track(process);
            }
        }
        supervisor
    }

    fn count(&self, predicate: impl Fn(&DirOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}
