//! Run-script selection from a project manifest

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{DevrunError, Result};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    scripts: serde_json::Map<String, Value>,
}

/// Chooses which manifest script to launch, first preferred name wins
#[derive(Debug, Clone)]
pub struct ScriptSelector {
    manifest: String,
    preferred: Vec<String>,
}

impl ScriptSelector {
    pub fn new(manifest: impl Into<String>, preferred: Vec<String>) -> Self {
        Self {
            manifest: manifest.into(),
            preferred,
        }
    }

    /// `Ok(None)` when the manifest has none of the preferred scripts.
    /// A missing or malformed manifest is an error the caller treats as "no script".
    pub fn select(&self, dir: &Path) -> Result<Option<String>> {
        let path = dir.join(&self.manifest);
        let content = std::fs::read_to_string(&path).map_err(|e| DevrunError::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| DevrunError::Manifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(self
            .preferred
            .iter()
            .find(|name| manifest.scripts.contains_key(name.as_str()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn selector() -> ScriptSelector {
        ScriptSelector::new("package.json", vec!["dev".to_string(), "start".to_string()])
    }

    fn write_manifest(dir: &Path, content: &str) {
        fs::write(dir.join("package.json"), content).unwrap();
    }

    #[test]
    fn test_dev_preferred_over_start() {
        let dir = tempdir().unwrap();
        write_manifest(
            dir.path(),
            r#"{"scripts": {"start": "node server.js", "dev": "vite"}}"#,
        );
        assert_eq!(selector().select(dir.path()).unwrap().as_deref(), Some("dev"));
    }

    #[test]
    fn test_start_used_as_fallback() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), r#"{"scripts": {"start": "node server.js"}}"#);
        assert_eq!(
            selector().select(dir.path()).unwrap().as_deref(),
            Some("start")
        );
    }

    #[test]
    fn test_neither_script_present() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), r#"{"scripts": {"build": "tsc"}}"#);
        assert_eq!(selector().select(dir.path()).unwrap(), None);

        write_manifest(dir.path(), r#"{"name": "no-scripts"}"#);
        assert_eq!(selector().select(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            selector().select(dir.path()),
            Err(DevrunError::Manifest { .. })
        ));
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "{ not json");
        assert!(matches!(
            selector().select(dir.path()),
            Err(DevrunError::Manifest { .. })
        ));
    }
}
