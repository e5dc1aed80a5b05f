//! Per-project configuration
//!
//! Stored as pretty-printed JSON in the marker file at the project root.
//! Every path field is relative to the project directory.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path};
use tracing::debug;

use crate::error::{Error, Result};

/// Project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the tex sources
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Directory latexmk writes its output to
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// File used when a command's <file> argument is omitted
    #[serde(default = "default_default_file")]
    pub default_file: String,

    /// The latexmk executable
    #[serde(default = "default_latexmk_command")]
    pub latexmk_command: String,

    /// Options passed to latexmk
    #[serde(default = "default_latexmk_options")]
    pub latexmk_options: String,

    /// How often the output artifact is polled (milliseconds)
    #[serde(default = "default_watch_interval")]
    pub watch_interval: u64,

    /// Application used to display the compiled document
    #[serde(default = "default_previewer")]
    pub previewer: String,

    /// Directory released documents are copied to
    #[serde(default = "default_release_dir")]
    pub release_dir: String,
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_default_file() -> String {
    "main.tex".to_string()
}

fn default_latexmk_command() -> String {
    "latexmk".to_string()
}

fn default_latexmk_options() -> String {
    "-pdf -xelatex -cd".to_string()
}

fn default_watch_interval() -> u64 {
    1000
}

fn default_previewer() -> String {
    crate::system::default_previewer().to_string()
}

fn default_release_dir() -> String {
    "release".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            build_dir: default_build_dir(),
            default_file: default_default_file(),
            latexmk_command: default_latexmk_command(),
            latexmk_options: default_latexmk_options(),
            watch_interval: default_watch_interval(),
            previewer: default_previewer(),
            release_dir: default_release_dir(),
        }
    }
}

impl Config {
    /// Load config from file, or the defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file, replacing any previous content
    ///
    /// The JSON is written to a temporary file next to the target and renamed
    /// over it, so a concurrent reader sees either the old or the new file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let content = serde_json::to_string_pretty(self).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Load the config, transform it and persist the result
    ///
    /// The updater returns `None` to leave the file untouched. Returns the
    /// configuration now in effect.
    pub fn update<F>(path: &Path, updater: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Option<Self>,
    {
        let current = Self::load(path)?;
        match updater(&current) {
            Some(updated) => {
                updated.save(path)?;
                Ok(updated)
            }
            None => Ok(current),
        }
    }

    /// Check the invariants a loaded or saved configuration must hold
    pub fn validate(&self) -> Result<()> {
        if self.watch_interval == 0 {
            return Err(Error::InvalidConfig(
                "watchInterval must be a positive number of milliseconds".to_string(),
            ));
        }

        for (field, value) in [
            ("sourceDir", &self.source_dir),
            ("buildDir", &self.build_dir),
            ("releaseDir", &self.release_dir),
        ] {
            let path = Path::new(value);
            let escapes = path.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
            if path.is_absolute() || escapes {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a path inside the project directory, got `{}`",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Input file name, falling back to `default_file`
    pub fn input_file<'a>(&'a self, file: Option<&'a str>) -> &'a str {
        match file {
            Some(f) if !f.is_empty() => f,
            _ => &self.default_file,
        }
    }
}
