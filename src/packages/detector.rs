use crate::error::{DevrunError, Result};
use crate::models::{DetectedPackageManager, PackageManagerDefinition};
use std::path::Path;

/// Picks a package manager for a directory from an ordered rule list
#[derive(Debug, Clone)]
pub struct LockfileDetector {
    definition: PackageManagerDefinition,
}

impl LockfileDetector {
    pub fn new(definition: PackageManagerDefinition) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &PackageManagerDefinition {
        &self.definition
    }

    /// Every lockfile name that identifies a project directory
    pub fn lockfile_names(&self) -> Vec<&str> {
        self.definition
            .detect
            .iter()
            .map(|detection| detection.lockfile.as_str())
            .collect()
    }

    /// Detect the package manager for `dir`; the first rule whose lockfile exists wins
    pub fn detect(&self, dir: &Path) -> Result<DetectedPackageManager> {
        self.definition
            .detect
            .iter()
            .find(|detection| dir.join(&detection.lockfile).is_file())
            .map(DetectedPackageManager::from)
            .ok_or_else(|| DevrunError::UnrecognizedDirectory {
                path: dir.to_path_buf(),
            })
    }

    /// Built-in rules for JavaScript projects (pnpm, then npm)
    pub fn default_definition() -> PackageManagerDefinition {
        serde_yaml::from_str(include_str!("config_templates/node.yml"))
            .unwrap_or_else(|e| panic!("Invalid built-in package manager definition: {e}"))
    }
}

impl Default for LockfileDetector {
    fn default() -> Self {
        Self::new(Self::default_definition())
    }
}
