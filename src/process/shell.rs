//! Shell-backed process runner.

use super::group;
use super::{ensure_command, ExecOptions, ExecOutput, ProcessRunner, TerminalLauncher, TerminalOptions};
use crate::error::ApiError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs commands under `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Clone)]
pub struct ShellProcessRunner {
    launcher: TerminalLauncher,
}

impl ShellProcessRunner {
    pub fn new(launcher: TerminalLauncher) -> Self {
        Self { launcher }
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

#[async_trait]
impl ProcessRunner for ShellProcessRunner {
    async fn execute(&self, command: &str, options: &ExecOptions) -> Result<ExecOutput, ApiError> {
        let command = ensure_command(command)?;
        let mut cmd = shell_command(command);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        group::isolate(&mut cmd);

        debug!(command, cwd = ?options.cwd, "Executing command");
        let started = Instant::now();
        let child = cmd.spawn().map_err(|e| ApiError::CommandFailed {
            command: command.to_string(),
            exit_code: None,
            stderr: format!("failed to spawn: {}", e),
        })?;

        match group::wait_or_kill(child, options.timeout).await {
            Ok(Some(output)) => Ok(ExecOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                duration_ms: started.elapsed().as_millis() as u64,
            }),
            Err(e) => Err(ApiError::CommandFailed {
                command: command.to_string(),
                exit_code: None,
                stderr: e.to_string(),
            }),
            Ok(None) => {
                let timeout_ms = options.timeout.as_millis() as u64;
                warn!(command, timeout_ms, "Command timed out and was killed");
                Err(ApiError::Timeout {
                    command: command.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    async fn spawn_terminal(
        &self,
        command: &str,
        options: &TerminalOptions,
    ) -> Result<(), ApiError> {
        let command = ensure_command(command)?;
        self.launcher
            .launch(command, &options.cwd, options.title.as_deref())
            .await
    }

    async fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<(), ApiError> {
        let program = ensure_command(program)?;
        debug!(program, ?args, "Spawning detached process");
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| ApiError::CommandFailed {
                command: program.to_string(),
                exit_code: None,
                stderr: e.to_string(),
            })
    }

    fn is_command_available(&self, name: &str) -> bool {
        !name.trim().is_empty() && which::which(name.trim()).is_ok()
    }
}
