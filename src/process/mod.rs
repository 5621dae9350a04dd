//! Process Runner
//!
//! Runs shell commands with a timeout, launches detached programs and opens
//! new terminal windows. Nothing here retries.

pub(crate) mod group;
pub mod shell;
pub mod terminal;

pub use shell::ShellProcessRunner;
pub use terminal::TerminalLauncher;

use crate::error::ApiError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options for a synchronous command run.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub timeout: Duration,
}

impl ExecOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            cwd: None,
            env: HashMap::new(),
            timeout,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Options for opening a terminal window.
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    pub cwd: PathBuf,
    pub title: Option<String>,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` under the platform shell and wait for it.
    ///
    /// A non-zero exit is reported in the output, not as an error. Exceeding
    /// the timeout kills the child and fails with `ApiError::Timeout`.
    async fn execute(&self, command: &str, options: &ExecOptions) -> Result<ExecOutput, ApiError>;

    /// Open a new terminal window running `command`. Returns once launched.
    async fn spawn_terminal(&self, command: &str, options: &TerminalOptions)
        -> Result<(), ApiError>;

    /// Start a program without waiting for it.
    async fn spawn_detached(&self, program: &str, args: &[String], cwd: &Path)
        -> Result<(), ApiError>;

    fn is_command_available(&self, name: &str) -> bool;
}

/// Reject empty and whitespace-only commands.
pub(crate) fn ensure_command(command: &str) -> Result<&str, ApiError> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(ApiError::EmptyCommand);
    }
    Ok(trimmed)
}
