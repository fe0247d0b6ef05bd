//! Error types shared by both runners

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevrunError {
    /// A required external binary is not on PATH
    #[error("required tool '{tool}' was not found on PATH")]
    MissingTool { tool: String },

    /// An external command exited unsuccessfully
    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    /// No known lockfile in the directory
    #[error("no recognized lockfile in {}", path.display())]
    UnrecognizedDirectory { path: PathBuf },

    #[error("could not read manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DevrunError>;
