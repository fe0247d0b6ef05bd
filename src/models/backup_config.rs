use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DevrunError, Result};

/// File read from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "devrun-backup.yml";

/// Prefix for environment overrides (e.g., `DEVRUN_BACKUP_PASSWORD`)
pub const ENV_PREFIX: &str = "DEVRUN_BACKUP_";

/// Everything the backup runner needs, resolved before the run starts
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// System package manager used to provision tooling
    pub package_manager: String,

    /// Tap to add before installing (Homebrew-style), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap: Option<String>,

    /// Package that provides the dump tool
    pub package: String,

    /// Dump binary invoked once per database
    pub dump_tool: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    pub auth_database: String,

    /// Databases to dump, in order
    pub databases: Vec<String>,

    /// Dumps land in `<output_dir>/<database>/`
    pub output_dir: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            package_manager: "brew".to_string(),
            tap: Some("mongodb/brew".to_string()),
            package: "mongodb-database-tools".to_string(),
            dump_tool: "mongodump".to_string(),
            host: None,
            username: None,
            password: None,
            auth_database: "admin".to_string(),
            databases: Vec::new(),
            output_dir: PathBuf::from("."),
        }
    }
}

// Hand-written so the password never reaches logs
impl fmt::Debug for BackupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupConfig")
            .field("package_manager", &self.package_manager)
            .field("tap", &self.tap)
            .field("package", &self.package)
            .field("dump_tool", &self.dump_tool)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("auth_database", &self.auth_database)
            .field("databases", &self.databases)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl BackupConfig {
    /// Resolve configuration: defaults, then the YAML file, then `.env` and
    /// process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!("Ignoring unreadable .env file: {e}");
        }
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DevrunError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
            .map_err(|e| DevrunError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Overlay `DEVRUN_BACKUP_*` values returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
        };

        if let Some(value) = var("PACKAGE_MANAGER") {
            self.package_manager = value;
        }
        if let Some(value) = var("TAP") {
            self.tap = Some(value);
        }
        if let Some(value) = var("PACKAGE") {
            self.package = value;
        }
        if let Some(value) = var("DUMP_TOOL") {
            self.dump_tool = value;
        }
        if let Some(value) = var("HOST") {
            self.host = Some(value);
        }
        if let Some(value) = var("USERNAME") {
            self.username = Some(value);
        }
        if let Some(value) = var("PASSWORD") {
            self.password = Some(value);
        }
        if let Some(value) = var("AUTH_DATABASE") {
            self.auth_database = value;
        }
        if let Some(value) = var("DATABASES") {
            self.databases = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = var("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.databases.is_empty() {
            return Err(DevrunError::Config(format!(
                "no databases configured; set `databases` in {DEFAULT_CONFIG_FILE} or {ENV_PREFIX}DATABASES"
            )));
        }
        if self.databases.iter().any(|name| name.trim().is_empty()) {
            return Err(DevrunError::Config(
                "database names must not be empty".to_string(),
            ));
        }
        if self.username.is_some() && self.password.is_none() {
            return Err(DevrunError::Config(format!(
                "a username is configured but no password; set {ENV_PREFIX}PASSWORD"
            )));
        }
        Ok(())
    }
}
