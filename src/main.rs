use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use devrun::discovery::find_git_repos;
use devrun::logging::init_logging;
use devrun::models::RunConfig;
use devrun::process::{Supervisor, SystemRunner};
use devrun::runner::{DirOutcome, RepoRunner, RunSummary};

#[derive(Parser)]
#[command(
    name = "devrun",
    about = "Install dependencies for every project under a directory and start their dev servers",
    version,
    author,
    long_about = None
)]
struct Cli {
    /// Install dependencies only; never launch a dev/start script
    #[arg(long)]
    no_run: bool,

    /// Print the commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// How many directory levels below the root to search for lockfiles
    #[arg(long, value_name = "N", default_value_t = 3, env = "DEVRUN_MAX_DEPTH")]
    max_depth: usize,

    /// Number of projects processed at once (1 = one after another)
    #[arg(long, value_name = "N", default_value_t = 1, env = "DEVRUN_CONCURRENCY")]
    concurrency: usize,

    /// Directory to search for projects
    #[arg(long, value_name = "DIR", default_value = ".", env = "DEVRUN_ROOT")]
    root: PathBuf,

    /// Directory that receives one <project>.log per launched script
    #[arg(long, value_name = "DIR", default_value = "logs", env = "DEVRUN_LOG_DIR")]
    log_dir: PathBuf,

    /// Skip directories whose name contains PATTERN (repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Stay in the foreground until launched scripts exit; Ctrl-C stops them
    #[arg(long)]
    wait: bool,

    /// List the Git repositories directly under the root, grouped, and exit
    #[arg(long)]
    list_repos: bool,

    /// Repositories per group in --list-repos output
    #[arg(long, value_name = "N", default_value = "4", requires = "list_repos")]
    group_size: NonZeroUsize,

    /// Enable verbose output (use -vv for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            root: self.root,
            max_depth: self.max_depth,
            concurrency: self.concurrency,
            no_run: self.no_run,
            dry_run: self.dry_run,
            log_dir: self.log_dir,
            exclude: self.exclude,
            wait: self.wait,
        }
    }
}

/// Usage errors exit with 1; help and version still exit 0
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

    if cli.list_repos {
        list_repos(&cli.root, &cli.exclude, cli.group_size)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = cli.into_config();
    let root = config.root.clone();
    let wait = config.wait;

    let repo = Arc::new(RepoRunner::new(Arc::new(SystemRunner), config));
    let jobs = repo
        .plan()
        .with_context(|| format!("Failed to search {} for projects", root.display()))?;

    if jobs.is_empty() {
        println!(
            "No projects found under {} (max depth {})",
            root.display(),
            repo.config().max_depth
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!("Found {} project(s):", jobs.len());
    for job in &jobs {
        println!("  {}", job.dir.display());
    }

    let mut summary = Arc::clone(&repo).run_all(jobs).await;
    print_summary(&summary);

    let supervisor = summary.take_processes();
    if wait && !supervisor.is_empty() {
        supervise(supervisor).await;
    } else {
        supervisor.detach();
    }

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn list_repos(root: &Path, exclude: &[String], group_size: NonZeroUsize) -> Result<()> {
    let repos = find_git_repos(root, exclude)
        .with_context(|| format!("Failed to list repositories in {}", root.display()))?;

    println!("Found {} repositories", repos.len());
    if repos.is_empty() {
        println!("No Git repositories found in {}", root.display());
        return Ok(());
    }

    for (index, group) in repos.chunks(group_size.get()).enumerate() {
        let names: Vec<_> = group
            .iter()
            .map(|repo| {
                repo.file_name().map_or_else(
                    || repo.display().to_string(),
                    |name| name.to_string_lossy().into_owned(),
                )
            })
            .collect();
        println!("Group {}: {}", index + 1, names.join(", "));
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for report in &summary.reports {
        let marker = match &report.outcome {
            DirOutcome::Launched { .. } | DirOutcome::Installed => "✓".green(),
            DirOutcome::DryRun => "·".cyan(),
            DirOutcome::Skipped(_) => "-".yellow(),
            DirOutcome::Failed(_) => "✗".red(),
        };
        println!("{marker} {}: {}", report.dir.display(), report.outcome);
    }

    let failed = summary.failed();
    if failed > 0 {
        println!(
            "\n{}",
            format!("{failed} of {} project(s) failed", summary.reports.len()).red()
        );
    }
}

async fn supervise(supervisor: Supervisor) {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    println!(
        "\nWaiting on {} process(es); press Ctrl-C to stop them",
        supervisor.len()
    );
    for exited in supervisor.wait_all(cancel).await {
        match exited.status {
            Ok(Some(status)) => println!("{} exited with {status}", exited.command),
            Ok(None) => {}
            Err(e) => println!(
                "{} {}: {e} (see {})",
                "✗".red(),
                exited.command,
                exited.log_path.display()
            ),
        }
    }
}
