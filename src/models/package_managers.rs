use serde::{Deserialize, Serialize};

/// Package manager detection rules for a project ecosystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManagerDefinition {
    /// Manifest file listing the project's scripts (e.g., "package.json")
    pub manifest: String,

    /// Detection rules, highest priority first
    pub detect: Vec<PackageManagerDetection>,

    /// Script names to launch, highest priority first
    pub scripts: Vec<String>,
}

/// Detection rule for a specific package manager tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManagerDetection {
    /// Name of the tool (e.g., "pnpm", "npm")
    pub name: String,

    /// Lock file that indicates this tool is used
    pub lockfile: String,

    /// Command to run for a deterministic install
    pub install: String,

    /// Command prefix that runs a manifest script; the script name is appended
    pub run: String,
}

/// Runtime detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPackageManager {
    /// Tool name (e.g., "pnpm")
    pub tool: String,
    /// Lockfile that matched
    pub lockfile: String,
    /// Install command
    pub install: String,
    /// Run command prefix
    pub run: String,
}

impl From<&PackageManagerDetection> for DetectedPackageManager {
    fn from(detection: &PackageManagerDetection) -> Self {
        Self {
            tool: detection.name.clone(),
            lockfile: detection.lockfile.clone(),
            install: detection.install.clone(),
            run: detection.run.clone(),
        }
    }
}
