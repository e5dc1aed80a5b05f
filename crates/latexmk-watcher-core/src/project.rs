//! Finding the project root
//!
//! A project is the nearest directory, walking up from where the command was
//! invoked, that contains the marker file. Outside any project the current
//! working directory stands in, which is where `init` will create the marker.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the configuration file that marks a directory as a project root
pub const CONFIG_NAME: &str = "latexmk-watcher.config.json";

/// Find the nearest marker file in `start` or any of its ancestors
///
/// The root directory is checked too. Returns `None` when no ancestor has one.
pub fn find_config_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start;

    loop {
        let candidate = dir.join(CONFIG_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return None,
        }
    }
}

/// Resolve the marker path for a command invoked in `cwd`
///
/// Falls back to the path the marker would have in `cwd`, which does not
/// exist yet and signals an uninitialized project.
pub fn locate_config_file(cwd: &Path) -> PathBuf {
    find_config_upward(cwd).unwrap_or_else(|| cwd.join(CONFIG_NAME))
}

/// Location of the project a command operates on
///
/// Computed once at startup and never changes for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    config_path: PathBuf,
    dir: PathBuf,
}

impl Project {
    /// Locate the project from the process's current working directory
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::locate_from(&cwd))
    }

    /// Locate the project by searching upward from `cwd`
    pub fn locate_from(cwd: &Path) -> Self {
        let config_path = locate_config_file(cwd);
        let dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());

        Self { config_path, dir }
    }

    /// Absolute path of the marker file (may not exist yet)
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The project directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the marker file currently exists on disk
    pub fn exists(&self) -> bool {
        self.config_path.is_file()
    }

    /// Path of a file relative to the project directory
    pub fn file<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.dir.join(relative)
    }
}
