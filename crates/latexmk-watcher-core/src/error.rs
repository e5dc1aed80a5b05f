//! Error types shared by every latexmk-watcher command

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user by latexmk-watcher
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Configuration file not found. Please configure your project directory \
         using the `init` command."
    )]
    ConfigurationMissing,

    #[error(
        "Configuration file already exists: {0}\n\
         Pass the --force option to recreate a configuration file."
    )]
    ConfigurationExists(PathBuf),

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} is not installed.")]
    ToolNotInstalled(String),

    #[error(
        "latexmk-watcher does not support this platform ({0}). Supported \
         platforms are macOS and Linux."
    )]
    UnsupportedPlatform(String),

    #[error("Command `{command}` failed with exit code {exit_code}: {stderr}")]
    ShellFailure {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
