use super::*;
use crate::process::testing::{Call, RecordingRunner};
use std::fs;
use tempfile::{TempDir, tempdir};

fn project(root: &Path, name: &str, lockfiles: &[&str], manifest: Option<&str>) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for lockfile in lockfiles {
        fs::write(dir.join(lockfile), "").unwrap();
    }
    if let Some(manifest) = manifest {
        fs::write(dir.join("package.json"), manifest).unwrap();
    }
    dir
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn config(root: &Path) -> RunConfig {
    RunConfig {
        root: root.to_path_buf(),
        log_dir: root.join("logs"),
        ..RunConfig::default()
    }
}

async fn run(runner: Arc<RecordingRunner>, config: RunConfig) -> RunSummary {
    let repo = Arc::new(RepoRunner::new(runner, config));
    let jobs = repo.plan().unwrap();
    repo.run_all(jobs).await
}

const DEV_AND_START: &str = r#"{"scripts": {"dev": "vite", "start": "node ."}}"#;
const START_ONLY: &str = r#"{"scripts": {"start": "node ."}}"#;

#[tokio::test]
async fn test_installs_and_launches_dev_script() {
    let (_guard, root) = workspace();
    let web = project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm", "npm"]));
    let summary = run(Arc::clone(&runner), config(&root)).await;

    assert_eq!(
        runner.calls(),
        vec![
            Call::Status {
                command: "pnpm install --frozen-lockfile".to_string(),
                cwd: Some(web.clone()),
            },
            Call::Launch {
                command: "pnpm run dev".to_string(),
                log_path: root.join("logs/web.log"),
            },
        ]
    );
    assert_eq!(summary.launched(), 1);
    assert!(!summary.has_failures());
}

#[tokio::test]
async fn test_start_script_fallback_with_npm() {
    let (_guard, root) = workspace();
    project(&root, "api", &["package-lock.json"], Some(START_ONLY));

    let runner = Arc::new(RecordingRunner::with_tools(&["npm"]));
    run(Arc::clone(&runner), config(&root)).await;

    assert_eq!(
        runner.launches(),
        vec![Call::Launch {
            command: "npm run start".to_string(),
            log_path: root.join("logs/api.log"),
        }]
    );
}

#[tokio::test]
async fn test_dry_run_spawns_nothing() {
    let (_guard, root) = workspace();
    project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));
    project(&root, "api", &["package-lock.json"], Some(START_ONLY));

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm", "npm"]));
    let summary = run(
        Arc::clone(&runner),
        RunConfig {
            dry_run: true,
            ..config(&root)
        },
    )
    .await;

    assert!(runner.calls().is_empty());
    assert!(
        summary
            .reports
            .iter()
            .all(|report| report.outcome == DirOutcome::DryRun)
    );
    assert!(!root.join("logs").exists());
}

#[tokio::test]
async fn test_no_run_never_launches() {
    let (_guard, root) = workspace();
    project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm"]));
    let summary = run(
        Arc::clone(&runner),
        RunConfig {
            no_run: true,
            ..config(&root)
        },
    )
    .await;

    assert!(runner.launches().is_empty());
    assert_eq!(runner.calls().len(), 1);
    assert_eq!(summary.reports[0].outcome, DirOutcome::Installed);
}

#[tokio::test]
async fn test_missing_script_skips_run() {
    let (_guard, root) = workspace();
    project(
        &root,
        "lib",
        &["pnpm-lock.yaml"],
        Some(r#"{"scripts": {"build": "tsc"}}"#),
    );
    project(&root, "bare", &["pnpm-lock.yaml"], None);

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm"]));
    let summary = run(Arc::clone(&runner), config(&root)).await;

    assert!(runner.launches().is_empty());
    assert!(
        summary
            .reports
            .iter()
            .all(|report| report.outcome == DirOutcome::Installed)
    );
}

#[tokio::test]
async fn test_missing_tool_fails_only_that_directory() {
    let (_guard, root) = workspace();
    project(&root, "api", &["package-lock.json"], Some(START_ONLY));
    project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));

    let runner = Arc::new(RecordingRunner::with_tools(&["npm"]));
    let summary = run(Arc::clone(&runner), config(&root)).await;

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.launched(), 1);
    let web = summary
        .reports
        .iter()
        .find(|report| report.dir.ends_with("web"))
        .unwrap();
    assert!(matches!(&web.outcome, DirOutcome::Failed(reason) if reason.contains("'pnpm'")));
}

#[tokio::test]
async fn test_install_failure_prevents_launch() {
    let (_guard, root) = workspace();
    project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));

    let runner =
        Arc::new(RecordingRunner::with_tools(&["pnpm"]).failing("pnpm install --frozen-lockfile"));
    let summary = run(Arc::clone(&runner), config(&root)).await;

    assert!(runner.launches().is_empty());
    assert!(summary.has_failures());
}

#[tokio::test]
async fn test_sequential_keeps_discovery_order() {
    let (_guard, root) = workspace();
    for name in ["charlie", "alpha", "bravo"] {
        project(&root, name, &["package-lock.json"], None);
    }

    let runner = Arc::new(RecordingRunner::with_tools(&["npm"]));
    let summary = run(Arc::clone(&runner), config(&root)).await;

    let cwds: Vec<_> = runner
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Status { cwd, .. } => cwd,
            Call::Launch { .. } => None,
        })
        .collect();
    assert_eq!(
        cwds,
        vec![root.join("alpha"), root.join("bravo"), root.join("charlie")]
    );
    let reported: Vec<_> = summary.reports.iter().map(|r| r.dir.clone()).collect();
    assert_eq!(reported, cwds);
}

#[tokio::test]
async fn test_parallel_processes_every_directory() {
    let (_guard, root) = workspace();
    for index in 0..6 {
        project(
            &root,
            &format!("app{index}"),
            &["pnpm-lock.yaml"],
            Some(DEV_AND_START),
        );
    }

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm"]));
    let summary = run(
        Arc::clone(&runner),
        RunConfig {
            concurrency: 3,
            ..config(&root)
        },
    )
    .await;

    assert_eq!(summary.reports.len(), 6);
    assert_eq!(summary.launched(), 6);
    assert_eq!(runner.launches().len(), 6);
}

#[tokio::test]
async fn test_huge_concurrency_is_capped_by_job_count() {
    let (_guard, root) = workspace();
    project(&root, "api", &["package-lock.json"], Some(START_ONLY));
    project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm", "npm"]));
    let summary = run(
        Arc::clone(&runner),
        RunConfig {
            concurrency: usize::MAX,
            ..config(&root)
        },
    )
    .await;

    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.launched(), 2);
    assert!(!summary.has_failures());
}

#[tokio::test]
async fn test_launched_processes_move_to_supervisor() {
    let (_guard, root) = workspace();
    project(&root, "web", &["pnpm-lock.yaml"], Some(DEV_AND_START));

    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm"]));
    let mut summary = run(runner, config(&root)).await;

    let supervisor = summary.take_processes();
    assert_eq!(supervisor.len(), 1);
    assert_eq!(supervisor.processes()[0].command(), "pnpm run dev");
    assert!(summary.reports[0].process.is_none());
}

#[tokio::test]
async fn test_unrecognized_directory_is_skipped() {
    let (_guard, root) = workspace();
    let runner = Arc::new(RecordingRunner::with_tools(&["pnpm"]));
    let repo = RepoRunner::new(runner, config(&root));

    let report = repo
        .process(Job {
            dir: root.clone(),
            log_name: "root".to_string(),
        })
        .await;
    assert!(matches!(report.outcome, DirOutcome::Skipped(_)));
}

#[test]
fn test_log_names_are_unique() {
    let dirs = vec![
        PathBuf::from("/w/apps/web"),
        PathBuf::from("/w/legacy/web"),
        PathBuf::from("/w/web-2"),
        PathBuf::from("/"),
    ];
    assert_eq!(assign_log_names(&dirs), vec!["web", "web-2", "web-2-2", "root"]);
}
