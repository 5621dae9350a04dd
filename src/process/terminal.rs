//! New-terminal launch shapes per platform.
//!
//! Each emulator takes "run this and keep the window" differently, so every
//! shape is spelled out rather than unified. The command line is run inside a
//! shell that stays open afterwards; a trailing `&& exit` in the command closes
//! the window on success.

use crate::error::ApiError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Operating system family a launch plan targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    MacOs,
    Windows,
}

impl TargetOs {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else if cfg!(windows) {
            TargetOs::Windows
        } else {
            TargetOs::Linux
        }
    }
}

/// One concrete way to open a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchPlan {
    fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }
}

const LINUX_TERMINALS: [&str; 7] = [
    "gnome-terminal",
    "konsole",
    "xfce4-terminal",
    "kitty",
    "alacritty",
    "xterm",
    "x-terminal-emulator",
];

fn linux_plan(terminal: &str, command: &str, cwd: &str, title: Option<&str>) -> LaunchPlan {
    let script = format!("{}; exec bash", command);
    let bash = |mut args: Vec<String>| {
        args.extend(["bash".to_string(), "-c".to_string(), script.clone()]);
        args
    };
    match terminal {
        "gnome-terminal" => {
            let mut args = vec![format!("--working-directory={}", cwd)];
            if let Some(title) = title {
                args.push(format!("--title={}", title));
            }
            args.push("--".to_string());
            LaunchPlan::new(terminal, bash(args))
        }
        "konsole" => LaunchPlan::new(
            terminal,
            bash(vec!["--workdir".to_string(), cwd.to_string(), "-e".to_string()]),
        ),
        "xfce4-terminal" => LaunchPlan::new(
            terminal,
            bash(vec![format!("--working-directory={}", cwd), "-x".to_string()]),
        ),
        "kitty" => LaunchPlan::new(
            terminal,
            bash(vec!["--directory".to_string(), cwd.to_string()]),
        ),
        "alacritty" => LaunchPlan::new(
            terminal,
            bash(vec![
                "--working-directory".to_string(),
                cwd.to_string(),
                "-e".to_string(),
            ]),
        ),
        other => LaunchPlan::new(other, bash(vec!["-e".to_string()])),
    }
}

fn applescript_quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Candidate launch plans in preference order.
pub fn launch_plans(
    os: TargetOs,
    command: &str,
    cwd: &Path,
    title: Option<&str>,
    preferred: Option<&str>,
) -> Vec<LaunchPlan> {
    let cwd_str = cwd.display().to_string();
    match os {
        TargetOs::MacOs => {
            let inner = format!("cd '{}' && {}", cwd_str.replace('\'', "'\\''"), command);
            vec![LaunchPlan::new(
                "osascript",
                vec![
                    "-e".to_string(),
                    format!(
                        "tell application \"Terminal\" to do script \"{}\"",
                        applescript_quote(&inner)
                    ),
                    "-e".to_string(),
                    "tell application \"Terminal\" to activate".to_string(),
                ],
            )]
        }
        TargetOs::Windows => vec![LaunchPlan::new(
            "cmd",
            vec![
                "/C".to_string(),
                "start".to_string(),
                title.unwrap_or("devsnap").to_string(),
                "/D".to_string(),
                cwd_str,
                "cmd".to_string(),
                "/K".to_string(),
                command.to_string(),
            ],
        )],
        TargetOs::Linux => {
            let mut order: Vec<&str> = Vec::new();
            if let Some(preferred) = preferred {
                order.push(preferred);
            }
            order.extend(LINUX_TERMINALS.iter().copied().filter(|t| Some(*t) != preferred));
            order
                .into_iter()
                .map(|t| linux_plan(t, command, &cwd_str, title))
                .collect()
        }
    }
}

/// Opens terminal windows using the first launch plan that works.
#[derive(Debug, Clone)]
pub struct TerminalLauncher {
    preferred: Option<String>,
    launch_timeout: Duration,
}

impl TerminalLauncher {
    pub fn new(preferred: Option<String>, launch_timeout: Duration) -> Self {
        Self {
            preferred,
            launch_timeout,
        }
    }

    /// Launch `command` in a new window; returns once the launcher is confirmed.
    pub async fn launch(
        &self,
        command: &str,
        cwd: &Path,
        title: Option<&str>,
    ) -> Result<(), ApiError> {
        let plans = launch_plans(
            TargetOs::current(),
            command,
            cwd,
            title,
            self.preferred.as_deref(),
        );

        let mut failures = Vec::new();
        for plan in plans {
            if which::which(&plan.program).is_err() {
                continue;
            }
            match self.try_plan(&plan, cwd).await {
                Ok(()) => {
                    debug!(program = %plan.program, "Terminal launched");
                    return Ok(());
                }
                Err(reason) => {
                    warn!("Terminal launcher {} failed: {}", plan.program, reason);
                    failures.push(format!("{}: {}", plan.program, reason));
                }
            }
        }

        Err(ApiError::CommandFailed {
            command: command.to_string(),
            exit_code: None,
            stderr: if failures.is_empty() {
                "no supported terminal emulator found".to_string()
            } else {
                failures.join("; ")
            },
        })
    }

    async fn try_plan(&self, plan: &LaunchPlan, cwd: &Path) -> Result<(), String> {
        let mut child = Command::new(&plan.program)
            .args(&plan.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| e.to_string())?;

        // Launchers either hand off and exit, or become the window process.
        match tokio::time::timeout(self.launch_timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(format!("exited with {}", status)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn linux_plans_keep_shell_open_and_honor_preference() {
        let cwd = PathBuf::from("/work/app");
        let plans = launch_plans(
            TargetOs::Linux,
            "npm run dev",
            &cwd,
            Some("dev"),
            Some("kitty"),
        );
        assert_eq!(plans[0].program, "kitty");
        assert_eq!(
            plans[0].args,
            vec!["--directory", "/work/app", "bash", "-c", "npm run dev; exec bash"]
        );

        let gnome = plans.iter().find(|p| p.program == "gnome-terminal").unwrap();
        assert_eq!(gnome.args[0], "--working-directory=/work/app");
        assert_eq!(gnome.args[1], "--title=dev");
        assert_eq!(gnome.args[2], "--");
        assert_eq!(plans.iter().filter(|p| p.program == "kitty").count(), 1);
    }

    #[test]
    fn macos_plan_escapes_quotes_for_applescript() {
        let plans = launch_plans(
            TargetOs::MacOs,
            "echo \"hi\"",
            Path::new("/Users/me/app"),
            None,
            None,
        );
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].program, "osascript");
        assert!(plans[0].args[1].contains("do script \"cd '/Users/me/app' && echo \\\"hi\\\"\""));
    }

    #[test]
    fn windows_plan_uses_start_with_keep_open_shell() {
        let plans = launch_plans(
            TargetOs::Windows,
            "npm test && exit",
            Path::new("C:\\app"),
            Some("tests"),
            None,
        );
        assert_eq!(
            plans[0].args,
            vec!["/C", "start", "tests", "/D", "C:\\app", "cmd", "/K", "npm test && exit"]
        );
    }
}
