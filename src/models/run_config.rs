use std::path::PathBuf;

/// Settings for one repository-runner invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory discovery starts from
    pub root: PathBuf,
    /// Deepest lockfile level to look at; the root itself is depth 0
    pub max_depth: usize,
    /// Directories processed at once; 0 and 1 both mean sequential
    pub concurrency: usize,
    /// Install dependencies but never launch a script
    pub no_run: bool,
    /// Print commands instead of executing them
    pub dry_run: bool,
    /// Where per-directory log files go
    pub log_dir: PathBuf,
    /// Directory name fragments that are never descended into
    pub exclude: Vec<String>,
    /// Keep supervising launched processes until they exit
    pub wait: bool,
}

impl RunConfig {
    pub fn is_sequential(&self) -> bool {
        self.concurrency <= 1
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_depth: 3,
            concurrency: 1,
            no_run: false,
            dry_run: false,
            log_dir: PathBuf::from("logs"),
            exclude: Vec::new(),
            wait: false,
        }
    }
}
