//! IDE command table and launcher.

use crate::error::ApiError;
use crate::process::ProcessRunner;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

const ALL: &[Platform] = &[Platform::Linux, Platform::Macos, Platform::Windows];
const UNIX: &[Platform] = &[Platform::Linux, Platform::Macos];

/// How to open a project in one editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeCommand {
    pub command: &'static str,
    /// Arguments placed before the project path
    pub args: &'static [&'static str],
    pub supported_platforms: &'static [Platform],
}

impl IdeCommand {
    pub fn supports(&self, platform: Platform) -> bool {
        self.supported_platforms.contains(&platform)
    }
}

const TABLE: &[(&str, IdeCommand)] = &[
    ("code", IdeCommand { command: "code", args: &[], supported_platforms: ALL }),
    ("cursor", IdeCommand { command: "cursor", args: &[], supported_platforms: ALL }),
    ("zed", IdeCommand { command: "zed", args: &[], supported_platforms: UNIX }),
    ("idea", IdeCommand { command: "idea", args: &[], supported_platforms: ALL }),
    ("subl", IdeCommand { command: "subl", args: &[], supported_platforms: ALL }),
    ("vim", IdeCommand { command: "vim", args: &[], supported_platforms: UNIX }),
    ("nvim", IdeCommand { command: "nvim", args: &[], supported_platforms: ALL }),
];

/// Static lookup of known editors.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdeCommandTable;

impl IdeCommandTable {
    pub fn lookup(&self, name: &str) -> Option<&'static IdeCommand> {
        let name = name.trim().to_ascii_lowercase();
        TABLE.iter().find(|(key, _)| *key == name).map(|(_, cmd)| cmd)
    }

    pub fn names(&self) -> Vec<&'static str> {
        TABLE.iter().map(|(key, _)| *key).collect()
    }
}

pub struct IdeLauncher {
    runner: Arc<dyn ProcessRunner>,
    table: IdeCommandTable,
}

impl IdeLauncher {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            table: IdeCommandTable,
        }
    }

    /// Open `project_root` in the named editor without waiting for it.
    pub async fn open(&self, ide: &str, project_root: &Path) -> Result<(), ApiError> {
        let entry = self.table.lookup(ide).ok_or_else(|| {
            ApiError::ValidationError(format!(
                "Unknown IDE '{}'. Known: {}",
                ide,
                self.table.names().join(", ")
            ))
        })?;
        if !entry.supports(Platform::current()) {
            return Err(ApiError::ValidationError(format!(
                "IDE '{}' is not supported on this platform",
                ide
            )));
        }
        if !self.runner.is_command_available(entry.command) {
            return Err(ApiError::NotFound(format!(
                "IDE command '{}' on PATH",
                entry.command
            )));
        }

        let mut args: Vec<String> = entry.args.iter().map(|a| a.to_string()).collect();
        args.push(project_root.display().to_string());
        self.runner
            .spawn_detached(entry.command, &args, project_root)
            .await?;
        info!(ide = entry.command, root = %project_root.display(), "Opened project in IDE");
        Ok(())
    }
}
