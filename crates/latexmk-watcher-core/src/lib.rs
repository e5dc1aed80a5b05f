//! latexmk-watcher core - shared functionality for the latexmk-watcher CLI
//!
//! Finds the project a command runs in, loads and persists its configuration,
//! runs shell commands and watches the builder's output artifact.

pub mod config;
pub mod context;
pub mod error;
pub mod latexmk;
pub mod project;
pub mod shell;
pub mod system;
pub mod watcher;

pub use config::Config;
pub use context::ProjectContext;
pub use error::{Error, Result};
pub use project::Project;
pub use watcher::{WatchHandle, Watcher};

/// Application name, also the stem of the marker file
pub const APP_NAME: &str = "latexmk-watcher";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
