//! Script/Collection Execution Engine
//!
//! `same-terminal` runs each command here and stops at the first failure.
//! `new-terminals` joins the commands into one line and hands it to a new
//! window; what happens in that window is not observed.

use super::domain::{ExecutionMode, ResolvedReference, Script, ScriptReference, TerminalCollection};
use crate::error::ApiError;
use crate::process::{ExecOptions, ProcessRunner, TerminalOptions};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CLOSE_TAIL: &str = " && exit";

/// One command run in `same-terminal` mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRun {
    pub name: String,
    pub command: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ScriptRunStatus {
    /// Every command exited zero.
    Completed,
    /// A command failed; later commands were not attempted.
    Failed { command: String, reason: String },
    /// Handed to a new terminal window.
    Launched,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRunReport {
    pub script_id: String,
    pub script_name: String,
    pub mode: ExecutionMode,
    pub commands: Vec<CommandRun>,
    #[serde(flatten)]
    pub status: ScriptRunStatus,
}

impl ScriptRunReport {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, ScriptRunStatus::Failed { .. })
    }

    /// Turn a failed run into `ApiError::CommandFailed`.
    pub fn into_result(self) -> Result<Self, ApiError> {
        if let ScriptRunStatus::Failed { command, reason } = &self.status {
            let exit_code = self.commands.last().and_then(|c| c.exit_code);
            return Err(ApiError::CommandFailed {
                command: command.clone(),
                exit_code,
                stderr: reason.clone(),
            });
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRunReport {
    pub collection_id: String,
    pub collection_name: String,
    pub mode: ExecutionMode,
    pub scripts: Vec<ScriptRunReport>,
    /// References whose script no longer exists
    pub dangling: Vec<ScriptReference>,
}

impl CollectionRunReport {
    pub fn succeeded(&self) -> bool {
        self.scripts.iter().all(ScriptRunReport::succeeded)
    }

    pub fn first_failure(&self) -> Option<&ScriptRunReport> {
        self.scripts.iter().find(|s| !s.succeeded())
    }
}

/// Join a script's commands into one shell line for a new terminal.
pub fn terminal_line(script: &Script, close_after: bool) -> String {
    let mut line = script
        .body
        .ordered_commands()
        .iter()
        .map(|c| c.command.trim())
        .collect::<Vec<_>>()
        .join(" && ");
    if close_after {
        line.push_str(CLOSE_TAIL);
    }
    line
}

pub struct ExecutionEngine {
    runner: Arc<dyn ProcessRunner>,
    script_timeout: Duration,
    script_delay: Duration,
}

impl ExecutionEngine {
    pub fn new(runner: Arc<dyn ProcessRunner>, script_timeout: Duration, script_delay: Duration) -> Self {
        Self {
            runner,
            script_timeout,
            script_delay,
        }
    }

    /// Run a script with its own mode.
    pub async fn run_script(&self, script: &Script) -> Result<ScriptRunReport, ApiError> {
        self.run_script_as(
            script,
            script.execution_mode,
            script.close_terminal_after_execution,
        )
        .await
    }

    /// Run a script under an explicit mode.
    pub async fn run_script_as(
        &self,
        script: &Script,
        mode: ExecutionMode,
        close_after: bool,
    ) -> Result<ScriptRunReport, ApiError> {
        match mode {
            ExecutionMode::Ide => Err(ApiError::UnsupportedExecutionMode(mode.to_string())),
            ExecutionMode::SameTerminal => self.run_in_process(script).await,
            ExecutionMode::NewTerminals => self.launch_terminal(script, close_after).await,
        }
    }

    async fn run_in_process(&self, script: &Script) -> Result<ScriptRunReport, ApiError> {
        let options = ExecOptions::new(self.script_timeout).in_dir(PathBuf::from(&script.root_path));
        let mut runs = Vec::new();

        for command in script.body.ordered_commands() {
            debug!(script = %script.name, command = %command.name, "Running script command");
            let failure = match self.runner.execute(&command.command, &options).await {
                Ok(output) => {
                    let success = output.success();
                    let reason = match output.exit_code {
                        Some(code) => format!("exited with code {}", code),
                        None => "terminated by signal".to_string(),
                    };
                    let stderr_tail = output.stderr.trim().to_string();
                    runs.push(CommandRun {
                        name: command.name.clone(),
                        command: command.command.clone(),
                        exit_code: output.exit_code,
                        duration_ms: output.duration_ms,
                        stdout: output.stdout,
                        stderr: output.stderr,
                    });
                    if success {
                        None
                    } else if stderr_tail.is_empty() {
                        Some(reason)
                    } else {
                        Some(format!("{}: {}", reason, stderr_tail))
                    }
                }
                Err(e @ (ApiError::Timeout { .. } | ApiError::CommandFailed { .. })) => {
                    runs.push(CommandRun {
                        name: command.name.clone(),
                        command: command.command.clone(),
                        exit_code: None,
                        duration_ms: self.script_timeout.as_millis() as u64,
                        stdout: String::new(),
                        stderr: e.to_string(),
                    });
                    Some(e.to_string())
                }
                Err(e) => return Err(e),
            };

            if let Some(reason) = failure {
                warn!(script = %script.name, command = %command.name, "Script stopped: {}", reason);
                return Ok(ScriptRunReport {
                    script_id: script.id.clone(),
                    script_name: script.name.clone(),
                    mode: ExecutionMode::SameTerminal,
                    commands: runs,
                    status: ScriptRunStatus::Failed {
                        command: command.command,
                        reason,
                    },
                });
            }
        }

        info!(script = %script.name, commands = runs.len(), "Script completed");
        Ok(ScriptRunReport {
            script_id: script.id.clone(),
            script_name: script.name.clone(),
            mode: ExecutionMode::SameTerminal,
            commands: runs,
            status: ScriptRunStatus::Completed,
        })
    }

    async fn launch_terminal(
        &self,
        script: &Script,
        close_after: bool,
    ) -> Result<ScriptRunReport, ApiError> {
        let line = terminal_line(script, close_after);
        let options = TerminalOptions {
            cwd: PathBuf::from(&script.root_path),
            title: Some(script.name.clone()),
        };
        self.runner.spawn_terminal(&line, &options).await?;
        info!(script = %script.name, "Script launched in new terminal");
        Ok(ScriptRunReport {
            script_id: script.id.clone(),
            script_name: script.name.clone(),
            mode: ExecutionMode::NewTerminals,
            commands: Vec::new(),
            status: ScriptRunStatus::Launched,
        })
    }

    /// Run the resolved scripts of a collection under the collection's mode.
    ///
    /// Dangling references are skipped and reported. In `same-terminal` mode
    /// the first failing script stops the collection.
    pub async fn run_collection(
        &self,
        collection: &TerminalCollection,
        resolved: Vec<ResolvedReference>,
    ) -> Result<CollectionRunReport, ApiError> {
        let mode = collection.execution_mode;
        if mode == ExecutionMode::Ide {
            return Err(ApiError::UnsupportedExecutionMode(mode.to_string()));
        }

        let mut report = CollectionRunReport {
            collection_id: collection.id.clone(),
            collection_name: collection.name.clone(),
            mode,
            scripts: Vec::new(),
            dangling: Vec::new(),
        };

        let mut ran_any = false;
        for reference in resolved {
            let script = match reference {
                ResolvedReference::Resolved(script) => script,
                ResolvedReference::Dangling { id, root_path } => {
                    warn!(collection = %collection.name, script = %id, "Skipping missing script");
                    report.dangling.push(ScriptReference { id, root_path });
                    continue;
                }
            };

            if mode == ExecutionMode::SameTerminal && ran_any && !self.script_delay.is_zero() {
                tokio::time::sleep(self.script_delay).await;
            }
            ran_any = true;

            let run = self
                .run_script_as(&script, mode, collection.close_terminal_after_execution)
                .await?;
            let failed = !run.succeeded();
            report.scripts.push(run);
            if failed {
                break;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory process runner that records what it was asked to run.

    use crate::error::ApiError;
    use crate::process::{ExecOptions, ExecOutput, ProcessRunner, TerminalOptions};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Execute { command: String, cwd: Option<PathBuf> },
        Terminal { command: String, cwd: PathBuf },
        Detached { program: String, args: Vec<String> },
    }

    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<Call>>,
        /// Exit codes by exact command; unlisted commands exit 0
        pub exit_codes: HashMap<String, i32>,
        pub timeouts: Vec<String>,
        pub available: Vec<String>,
        /// When each execute or terminal call arrived
        pub stamps: Mutex<Vec<tokio::time::Instant>>,
    }

    impl RecordingRunner {
        pub fn failing(command: &str, code: i32) -> Self {
            let mut runner = Self::default();
            runner.exit_codes.insert(command.to_string(), code);
            runner
        }

        pub fn executed(&self) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .filter_map(|c| match c {
                    Call::Execute { command, .. } => Some(command.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn terminals(&self) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .filter_map(|c| match c {
                    Call::Terminal { command, .. } => Some(command.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn execute(&self, command: &str, options: &ExecOptions) -> Result<ExecOutput, ApiError> {
            let command = crate::process::ensure_command(command)?;
            self.stamps.lock().push(tokio::time::Instant::now());
            self.calls.lock().push(Call::Execute {
                command: command.to_string(),
                cwd: options.cwd.clone(),
            });
            if self.timeouts.iter().any(|t| t == command) {
                return Err(ApiError::Timeout {
                    command: command.to_string(),
                    timeout_ms: options.timeout.as_millis() as u64,
                });
            }
            let code = self.exit_codes.get(command).copied().unwrap_or(0);
            Ok(ExecOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: if code == 0 { String::new() } else { "boom".to_string() },
                duration_ms: 1,
            })
        }

        async fn spawn_terminal(&self, command: &str, options: &TerminalOptions) -> Result<(), ApiError> {
            let command = crate::process::ensure_command(command)?;
            self.stamps.lock().push(tokio::time::Instant::now());
            self.calls.lock().push(Call::Terminal {
                command: command.to_string(),
                cwd: options.cwd.clone(),
            });
            Ok(())
        }

        async fn spawn_detached(&self, program: &str, args: &[String], _cwd: &Path) -> Result<(), ApiError> {
            self.calls.lock().push(Call::Detached {
                program: program.to_string(),
                args: args.to_vec(),
            });
            Ok(())
        }

        fn is_command_available(&self, name: &str) -> bool {
            self.available.iter().any(|a| a == name)
        }
    }
}
