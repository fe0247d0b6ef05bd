use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;

use devrun::backup::BackupRunner;
use devrun::logging::init_logging;
use devrun::models::BackupConfig;
use devrun::process::SystemRunner;

#[derive(Parser)]
#[command(
    name = "devrun-backup",
    about = "Install database tools and dump each configured database into the current directory",
    version,
    author,
    long_about = "Install database tools and dump each configured database.\n\n\
        Settings come from devrun-backup.yml (or --config), then DEVRUN_BACKUP_* \
        environment variables. A .env file in the working directory is read first."
)]
struct Cli {
    /// YAML file with backup settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output (use -vv for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = parse_cli();
    init_logging(cli.verbose);

    let config = BackupConfig::load(cli.config.as_deref())
        .context("Failed to load backup configuration")?;
    let output_dir = config.output_dir.clone();

    let backup = BackupRunner::new(Arc::new(SystemRunner), config, cli.dry_run);
    let reports = backup.run().await.context("Backup preflight failed")?;

    let mut failed = 0;
    for report in &reports {
        if report.succeeded() {
            println!("{} {report}", "✓".green());
        } else {
            failed += 1;
            println!("{} {report}", "✗".red());
        }
    }

    if failed > 0 {
        println!(
            "\n{}",
            format!("{failed} of {} backup(s) failed", reports.len()).red()
        );
        return Ok(ExitCode::FAILURE);
    }

    if !cli.dry_run {
        println!("\nBackups written to {}", output_dir.display());
    }
    Ok(ExitCode::SUCCESS)
}
