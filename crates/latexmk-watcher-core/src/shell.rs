//! Shell command execution
//!
//! Two modes:
//!   - `run` waits for a command and captures its output. Failures, including
//!     a failure to launch, come back as a non-zero exit code, never as `Err`.
//!   - `spawn` starts a command in the background and streams its output to
//!     this process's stdout/stderr. Launch failures are logged.

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::Error;

/// Output of a finished shell command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a failed run into `Error::ShellFailure`
    pub fn into_result(self, command: &str) -> Result<Self, Error> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::ShellFailure {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run a shell command to completion and capture its output
pub async fn run(command: &str, working_dir: Option<&Path>) -> ShellOutput {
    debug!(command, "running shell command");

    let mut cmd = shell_command(command);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) => {
            return ShellOutput {
                stdout: String::new(),
                stderr: format!("Failed to run command: {}", e),
                exit_code: 1,
            };
        }
    };

    // Killed by a signal: no exit code, still a failure
    let exit_code = output.status.code().unwrap_or(1);
    debug!(command, exit_code, "shell command finished");

    ShellOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code,
    }
}

/// A command started with [`spawn`]
#[derive(Debug)]
pub struct SpawnHandle {
    command: String,
    task: JoinHandle<()>,
}

impl SpawnHandle {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the command (and its output forwarding) has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Kill the child process and stop forwarding its output
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Wait for the command to exit
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Start a shell command in the background
///
/// Must be called from within a tokio runtime. The child is killed when the
/// returned handle is stopped.
pub fn spawn(command: &str, working_dir: &Path) -> SpawnHandle {
    let command = command.to_string();
    let working_dir: PathBuf = working_dir.to_path_buf();
    let task_command = command.clone();

    let task = tokio::spawn(async move {
        let mut cmd = shell_command(&task_command);
        cmd.current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(command = %task_command, "Failed to start subprocess: {}", e);
                return;
            }
        };

        let stdout = child.stdout.take().map(|mut out| {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut out, &mut tokio::io::stdout()).await;
            })
        });
        let stderr = child.stderr.take().map(|mut err| {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut err, &mut tokio::io::stderr()).await;
            })
        });

        match child.wait().await {
            Ok(status) if status.success() => {
                debug!(command = %task_command, "subprocess exited")
            }
            Ok(status) => {
                warn!(command = %task_command, code = ?status.code(), "subprocess failed")
            }
            Err(e) => error!(command = %task_command, "Failed to wait for subprocess: {}", e),
        }

        for forward in [stdout, stderr].into_iter().flatten() {
            let _ = forward.await;
        }
    });

    SpawnHandle { command, task }
}

/// Line echoed before a command runs
pub fn executed_command_line(command: &str) -> String {
    format!("Executing shell command: {}", command.yellow())
}

/// Echo a command before executing it
pub fn print_executed_command(command: &str) {
    println!("{}", executed_command_line(command));
}

/// Quote a word for `sh` if it contains anything the shell would interpret
pub fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));

    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
