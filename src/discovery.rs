//! Bounded filesystem scan for project directories

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// Directories that are never descended into
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

pub struct ProjectScanner<'a> {
    lockfiles: Vec<&'a str>,
    exclude: &'a [String],
    max_depth: usize,
}

impl<'a> ProjectScanner<'a> {
    pub fn new(lockfiles: Vec<&'a str>, exclude: &'a [String], max_depth: usize) -> Self {
        Self {
            lockfiles,
            exclude,
            max_depth,
        }
    }

    /// Directories under `root` holding a known lockfile, deduplicated and
    /// sorted. A lockfile directly in `root` is depth 1.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root.canonicalize()?;
        let mut found = BTreeSet::new();

        let walker = WalkDir::new(&root)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_skipped(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path during discovery: {e}");
                    continue;
                }
            };

            if entry.file_type().is_file()
                && self.is_lockfile(&entry)
                && let Some(parent) = entry.path().parent()
            {
                debug!("Found {}", entry.path().display());
                found.insert(parent.to_path_buf());
            }
        }

        Ok(found.into_iter().collect())
    }

    fn is_lockfile(&self, entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.lockfiles.contains(&name))
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        SKIPPED_DIRS.contains(&name) || is_excluded(name, self.exclude)
    }
}

fn is_excluded(name: &str, exclude: &[String]) -> bool {
    exclude
        .iter()
        .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()))
}

/// Immediate children of `root` that are Git checkouts, sorted by name.
///
/// A missing `root` yields an empty list.
pub fn find_git_repos(root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        debug!("{} does not exist, no repositories", root.display());
        return Ok(Vec::new());
    }

    let mut repos = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() || !entry.path().join(".git").is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| is_excluded(name, exclude))
        {
            debug!("Excluding {}", entry.path().display());
            continue;
        }
        repos.push(entry.into_path());
    }
    Ok(repos)
}
