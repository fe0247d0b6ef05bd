//! Backup runner: preflight → provision → dump each configured database

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{DevrunError, Result};
use crate::models::BackupConfig;
use crate::process::{CommandSpec, ProcessRunner, run_checked};

/// Result of dumping one database
#[derive(Debug)]
pub struct DumpReport {
    pub database: String,
    pub result: Result<()>,
}

impl DumpReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "{}: backed up", self.database),
            Err(e) => write!(f, "{}: backup failed: {e}", self.database),
        }
    }
}

pub struct BackupRunner<R> {
    runner: Arc<R>,
    config: BackupConfig,
    dry_run: bool,
}

impl<R: ProcessRunner> BackupRunner<R> {
    pub fn new(runner: Arc<R>, config: BackupConfig, dry_run: bool) -> Self {
        Self {
            runner,
            config,
            dry_run,
        }
    }

    /// Preflight then provision then the dump loop. Only preflight can fail the run.
    pub async fn run(&self) -> Result<Vec<DumpReport>> {
        self.preflight()?;
        self.provision().await;
        Ok(self.dump_all().await)
    }

    /// The system package manager must be on PATH
    pub fn preflight(&self) -> Result<()> {
        match self.runner.locate(&self.config.package_manager) {
            Some(path) => {
                info!("Using {}", path.display());
                Ok(())
            }
            None => Err(DevrunError::MissingTool {
                tool: self.config.package_manager.clone(),
            }),
        }
    }

    /// Tap (when configured) and install the tooling package. Failures are
    /// logged; the dump loop reports their consequences per database.
    pub async fn provision(&self) {
        for command in self.provision_commands() {
            if self.dry_run {
                println!("[dry-run] {command}");
                continue;
            }
            info!("Running `{command}`");
            if let Err(e) = run_checked(self.runner.as_ref(), &command).await {
                warn!("Provisioning step failed: {e}");
            }
        }
    }

    /// One attempt per database, in order, never stopping early
    pub async fn dump_all(&self) -> Vec<DumpReport> {
        let mut reports = Vec::with_capacity(self.config.databases.len());
        for database in &self.config.databases {
            let result = self.dump(database).await;
            if let Err(e) = &result {
                error!("Backup of {database} failed: {e}");
            }
            reports.push(DumpReport {
                database: database.clone(),
                result,
            });
        }
        reports
    }

    async fn dump(&self, database: &str) -> Result<()> {
        let command = self.dump_command(database);

        if self.runner.locate(&command.program).is_none() {
            return Err(DevrunError::MissingTool {
                tool: command.program.clone(),
            });
        }

        if self.dry_run {
            println!("[dry-run] {command}");
            return Ok(());
        }

        info!("Dumping {database}");
        run_checked(self.runner.as_ref(), &command).await
    }

    pub fn provision_commands(&self) -> Vec<CommandSpec> {
        let mut commands = Vec::new();
        if let Some(tap) = &self.config.tap {
            commands.push(
                CommandSpec::new(&self.config.package_manager)
                    .arg("tap")
                    .arg(tap),
            );
        }
        commands.push(
            CommandSpec::new(&self.config.package_manager)
                .arg("install")
                .arg(&self.config.package),
        );
        commands
    }

    pub fn dump_command(&self, database: &str) -> CommandSpec {
        let config = &self.config;
        let mut command = CommandSpec::new(&config.dump_tool);
        if let Some(host) = &config.host {
            command = command.arg("--host").arg(host);
        }
        if let Some(username) = &config.username {
            command = command.arg("--username").arg(username);
        }
        if let Some(password) = &config.password {
            command = command.arg("--password").secret_arg(password);
        }
        if config.username.is_some() {
            command = command
                .arg("--authenticationDatabase")
                .arg(&config.auth_database);
        }
        command
            .arg("--db")
            .arg(database)
            .arg("--out")
            .arg(config.output_dir.to_string_lossy())
    }
}
