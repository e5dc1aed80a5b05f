//! Host platform detection and viewer invocation

use std::path::Path;

use crate::error::{Error, Result};
use crate::shell::quote;

/// Platforms latexmk-watcher knows how to open files on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the host platform, failing on anything unsupported
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }

    /// Viewer used when the configuration doesn't name one
    pub fn default_previewer(&self) -> &'static str {
        match self {
            Self::MacOs => "Safari",
            Self::Linux => "xdg-open",
        }
    }

    /// Shell command that opens `file` with the `previewer` application
    pub fn open_command(&self, previewer: &str, file: &Path) -> String {
        let file = quote(&file.to_string_lossy());
        match self {
            Self::MacOs => format!("open -a {} {}", quote(previewer), file),
            Self::Linux => format!("{} {}", previewer, file),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check that the host platform is supported
pub fn check_system() -> Result<Platform> {
    Platform::current()
}

/// Default viewer for the host, `xdg-open` where the platform is unknown
pub fn default_previewer() -> &'static str {
    Platform::current()
        .map(|p| p.default_previewer())
        .unwrap_or("xdg-open")
}
