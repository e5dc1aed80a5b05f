//! latexmk probing and command composition

use regex::Regex;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::shell::{self, quote};

/// Shown in place of a version when latexmk can't be run
pub const NOT_INSTALLED: &str = "(Not Installed)";

fn version_command(latexmk_command: &str) -> String {
    format!("{} --version", latexmk_command)
}

/// Extract the version number from `latexmk --version` output
///
/// Returns the raw output when it doesn't contain a recognizable version.
pub fn parse_version(stdout: &str) -> String {
    let re = Regex::new(r"Version\s+(\d+\.\d+)").expect("valid regex");
    match re.captures(stdout) {
        Some(caps) => caps[1].to_string(),
        None => stdout.trim().to_string(),
    }
}

/// Version of latexmk, or [`NOT_INSTALLED`] if the version probe fails
pub async fn version(latexmk_command: &str) -> String {
    let out = shell::run(&version_command(latexmk_command), None).await;
    if out.success() {
        parse_version(&out.stdout)
    } else {
        NOT_INSTALLED.to_string()
    }
}

/// Whether `<latexmk_command> --version` exits successfully
pub async fn installed(latexmk_command: &str) -> bool {
    shell::run(&version_command(latexmk_command), None)
        .await
        .success()
}

/// Fail with `ToolNotInstalled` unless latexmk can be run
pub async fn ensure_installed(latexmk_command: &str) -> Result<()> {
    if installed(latexmk_command).await {
        Ok(())
    } else {
        Err(Error::ToolNotInstalled(latexmk_command.to_string()))
    }
}

/// `<command> <options> -output-directory=<buildDir> <input>`
pub fn build_command(config: &Config, input: &Path) -> String {
    let mut parts = vec![config.latexmk_command.clone()];
    if !config.latexmk_options.trim().is_empty() {
        parts.push(config.latexmk_options.trim().to_string());
    }
    parts.push(format!("-output-directory={}", quote(&config.build_dir)));
    parts.push(quote(&input.to_string_lossy()));
    parts.join(" ")
}

/// `<command> -C -output-directory=<buildDir> <input>`, removing generated files
pub fn clean_command(config: &Config, input: &Path) -> String {
    format!(
        "{} -C -output-directory={} {}",
        config.latexmk_command,
        quote(&config.build_dir),
        quote(&input.to_string_lossy())
    )
}
