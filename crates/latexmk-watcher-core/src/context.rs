//! Command context: the project plus its configuration
//!
//! One `ProjectContext` is built per invocation and passed to the command
//! handlers. Saving through it refreshes the in-memory copy, so later reads in
//! the same process observe what was written without going back to disk.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::project::Project;

pub struct ProjectContext {
    project: Project,
    config: Config,
}

impl ProjectContext {
    /// Locate the project from the current directory and load its config
    pub fn discover() -> Result<Self> {
        Self::load(Project::discover()?)
    }

    /// Load the configuration of an already located project
    pub fn load(project: Project) -> Result<Self> {
        let config = Config::load(project.config_path())?;
        Ok(Self { project, config })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the project has been initialized
    pub fn is_initialized(&self) -> bool {
        self.project.exists()
    }

    /// Fail with `ConfigurationMissing` unless the marker file exists
    pub fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::ConfigurationMissing)
        }
    }

    /// Persist `config` and make it the configuration in effect
    pub fn save(&mut self, config: Config) -> Result<()> {
        config.save(self.project.config_path())?;
        self.config = config;
        Ok(())
    }

    /// Re-read the configuration on disk and apply `updater` to it
    ///
    /// See [`Config::update`]. The in-memory copy is refreshed either way.
    pub fn update<F>(&mut self, updater: F) -> Result<&Config>
    where
        F: FnOnce(&Config) -> Option<Config>,
    {
        self.config = Config::update(self.project.config_path(), updater)?;
        Ok(&self.config)
    }

    /// Absolute path of a file in the source directory
    pub fn source_file(&self, file: &str) -> PathBuf {
        self.project.dir().join(&self.config.source_dir).join(file)
    }

    /// Absolute path of the PDF latexmk builds from `file`
    pub fn artifact_path(&self, file: &str) -> PathBuf {
        self.project
            .dir()
            .join(&self.config.build_dir)
            .join(pdf_name(file))
    }

    /// Absolute path a released copy of `file` is written to
    pub fn release_path(&self, file: &str) -> PathBuf {
        self.project
            .dir()
            .join(&self.config.release_dir)
            .join(pdf_name(file))
    }
}

/// `chapters/main.tex` -> `main.pdf`
fn pdf_name(file: &str) -> PathBuf {
    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    PathBuf::from(format!("{}.pdf", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::CONFIG_NAME;
    use tempfile::tempdir;

    fn initialized_project() -> (tempfile::TempDir, Project) {
        let temp = tempdir().unwrap();
        Config::default()
            .save(&temp.path().join(CONFIG_NAME))
            .unwrap();
        let project = Project::locate_from(temp.path());
        (temp, project)
    }

    #[test]
    fn test_uninitialized_context() {
        let temp = tempdir().unwrap();
        let project = Project::locate_from(temp.path());
        if project.exists() {
            // A marker above the temp dir; nothing to check here.
            return;
        }

        let ctx = ProjectContext::load(project).unwrap();
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.config(), &Config::default());
        assert!(matches!(
            ctx.require_initialized().unwrap_err(),
            Error::ConfigurationMissing
        ));
    }

    #[test]
    fn test_save_refreshes_in_memory_config() {
        let (_temp, project) = initialized_project();
        let mut ctx = ProjectContext::load(project.clone()).unwrap();

        let config = Config {
            build_dir: "out".to_string(),
            ..ctx.config().clone()
        };
        ctx.save(config.clone()).unwrap();

        assert_eq!(ctx.config(), &config);
        assert_eq!(ProjectContext::load(project).unwrap().config(), &config);
    }

    #[test]
    fn test_update_refreshes_in_memory_config() {
        let (_temp, project) = initialized_project();
        let mut ctx = ProjectContext::load(project).unwrap();

        ctx.update(|current| {
            Some(Config {
                watch_interval: 200,
                ..current.clone()
            })
        })
        .unwrap();
        assert_eq!(ctx.config().watch_interval, 200);
    }

    #[test]
    fn test_resolved_paths() {
        let (temp, project) = initialized_project();
        let ctx = ProjectContext::load(project).unwrap();
        let dir = temp.path();

        assert_eq!(ctx.source_file("myfile.tex"), dir.join("src/myfile.tex"));
        assert_eq!(ctx.artifact_path("main.tex"), dir.join("build/main.pdf"));
        assert_eq!(ctx.release_path("main.tex"), dir.join("release/main.pdf"));
        assert_eq!(
            ctx.artifact_path("chapters/notes.tex"),
            dir.join("build/notes.pdf")
        );
    }

    #[test]
    fn test_pdf_name() {
        assert_eq!(pdf_name("main.tex"), PathBuf::from("main.pdf"));
        assert_eq!(pdf_name("paper"), PathBuf::from("paper.pdf"));
        assert_eq!(pdf_name("a/b/report.ltx"), PathBuf::from("report.pdf"));
    }
}
