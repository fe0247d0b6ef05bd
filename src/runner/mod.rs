//! Repository runner: discover → classify → install → select script → run

mod report;

pub use report::{DirOutcome, DirReport, RunSummary};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::discovery::ProjectScanner;
use crate::error::{DevrunError, Result};
use crate::models::{DetectedPackageManager, RunConfig};
use crate::packages::{LockfileDetector, PackageInstaller, ScriptSelector};
use crate::process::{ProcessRunner, run_checked};

/// One discovered directory plus the log name reserved for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub dir: PathBuf,
    pub log_name: String,
}

pub struct RepoRunner<R> {
    runner: Arc<R>,
    detector: LockfileDetector,
    scripts: ScriptSelector,
    config: RunConfig,
}

impl<R: ProcessRunner> RepoRunner<R> {
    pub fn new(runner: Arc<R>, config: RunConfig) -> Self {
        Self::with_detector(runner, config, LockfileDetector::default())
    }

    pub fn with_detector(runner: Arc<R>, config: RunConfig, detector: LockfileDetector) -> Self {
        let definition = detector.definition();
        let scripts = ScriptSelector::new(definition.manifest.clone(), definition.scripts.clone());
        Self {
            runner,
            detector,
            scripts,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Discover candidate directories and reserve a log name for each
    pub fn plan(&self) -> Result<Vec<Job>> {
        let scanner = ProjectScanner::new(
            self.detector.lockfile_names(),
            &self.config.exclude,
            self.config.max_depth,
        );
        let dirs = scanner.scan(&self.config.root)?;
        let names = assign_log_names(&dirs);

        Ok(dirs
            .into_iter()
            .zip(names)
            .map(|(dir, log_name)| Job { dir, log_name })
            .collect())
    }

    /// Process every job. Sequential mode keeps discovery order; otherwise at
    /// most `concurrency` directories are in flight and reports arrive in
    /// completion order.
    pub async fn run_all(self: Arc<Self>, jobs: Vec<Job>) -> RunSummary {
        let mut reports = Vec::with_capacity(jobs.len());

        if self.config.is_sequential() {
            for job in jobs {
                reports.push(self.process(job).await);
            }
            return RunSummary::new(reports);
        }

        // More permits than jobs buys nothing, and Semaphore panics past MAX_PERMITS
        let permits = self.config.concurrency.min(jobs.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut workers = JoinSet::new();
        for job in jobs {
            let this = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return DirReport::failed(job.dir, e.to_string()),
                };
                this.process(job).await
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!("Worker stopped unexpectedly: {e}"),
            }
        }
        RunSummary::new(reports)
    }

    /// Full pipeline for one directory. Never fails the whole run.
    pub async fn process(&self, job: Job) -> DirReport {
        let dir = job.dir.clone();
        match self.process_inner(job).await {
            Ok(report) => report,
            Err(e @ DevrunError::UnrecognizedDirectory { .. }) => {
                warn!("{e}, skipping");
                DirReport::new(dir, DirOutcome::Skipped(e.to_string()))
            }
            Err(e) => {
                error!("{}: {e}", dir.display());
                DirReport::failed(dir, e.to_string())
            }
        }
    }

    async fn process_inner(&self, job: Job) -> Result<DirReport> {
        let dir = job.dir;
        let detected = self.detector.detect(&dir)?;
        info!(
            "{}: using {} ({})",
            dir.display(),
            detected.tool,
            detected.lockfile
        );

        self.install(&detected, &dir).await?;

        if self.config.no_run {
            debug!("{}: install only, not launching", dir.display());
            return Ok(DirReport::new(dir, self.finished_outcome()));
        }

        let script = match self.scripts.select(&dir) {
            Ok(Some(script)) => script,
            Ok(None) => {
                warn!(
                    "{}: no {} script found, skipping run",
                    dir.display(),
                    self.script_names()
                );
                return Ok(DirReport::new(dir, self.finished_outcome()));
            }
            Err(e) => {
                warn!("{e}, skipping run");
                return Ok(DirReport::new(dir, self.finished_outcome()));
            }
        };

        let command = PackageInstaller::run_command(&detected, &script, &dir).ok_or_else(|| {
            DevrunError::Config(format!("empty run command for {}", detected.tool))
        })?;
        let log_path = self.config.log_dir.join(format!("{}.log", job.log_name));

        if self.config.dry_run {
            println!(
                "[dry-run] {}: {command} > {} 2>&1 &",
                dir.display(),
                log_path.display()
            );
            return Ok(DirReport::new(dir, DirOutcome::DryRun));
        }

        let launched =
            self.runner
                .launch(&command, &log_path)
                .map_err(|source| DevrunError::Spawn {
                    command: command.to_string(),
                    source,
                })?;
        info!(
            "{}: launched `{command}`, logging to {}",
            dir.display(),
            log_path.display()
        );
        Ok(DirReport::launched(dir, launched))
    }

    async fn install(&self, detected: &DetectedPackageManager, dir: &Path) -> Result<()> {
        let command = PackageInstaller::install_command(detected, dir).ok_or_else(|| {
            DevrunError::Config(format!("empty install command for {}", detected.tool))
        })?;

        if self.runner.locate(&command.program).is_none() {
            return Err(DevrunError::MissingTool {
                tool: command.program.clone(),
            });
        }

        if self.config.dry_run {
            println!("[dry-run] {}: {command}", dir.display());
            return Ok(());
        }

        run_checked(self.runner.as_ref(), &command).await
    }

    fn finished_outcome(&self) -> DirOutcome {
        if self.config.dry_run {
            DirOutcome::DryRun
        } else {
            DirOutcome::Installed
        }
    }

    fn script_names(&self) -> String {
        self.detector.definition().scripts.join("/")
    }
}

/// Log file stem per directory: its base name, suffixed `-2`, `-3`, … on clashes
pub fn assign_log_names(dirs: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    dirs.iter()
        .map(|dir| {
            let base = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "root".to_string());
            let mut name = base.clone();
            let mut suffix = 1;
            while !used.insert(name.clone()) {
                suffix += 1;
                name = format!("{base}-{suffix}");
            }
            name
        })
        .collect()
}

#[cfg(test)]
mod tests;
