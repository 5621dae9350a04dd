//! Configuration
//!
//! Process-level settings layered by the `config` crate, plus user preferences
//! persisted in the record store.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod preferences;
pub mod sources;
pub mod storage;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use preferences::{PreferencesRepository, UserPreferences};
pub use storage::{EncryptionConfig, StorageConfig};

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level devsnap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevsnapConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Git subprocess settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Timeout for each git invocation
    #[serde(default = "default_git_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_git_timeout_ms() -> u64 {
    10_000
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_git_timeout_ms(),
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Script execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Per-command timeout in same-terminal mode
    #[serde(default = "default_script_timeout_ms")]
    pub timeout_ms: u64,

    /// Pause between scripts of a collection run in the same terminal
    #[serde(default = "default_script_delay_ms")]
    pub script_delay_ms: u64,
}

fn default_script_timeout_ms() -> u64 {
    30_000
}

fn default_script_delay_ms() -> u64 {
    500
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_script_timeout_ms(),
            script_delay_ms: default_script_delay_ms(),
        }
    }
}

/// Terminal launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// How long to wait for the launcher to report an immediate failure
    #[serde(default = "default_launch_timeout_ms")]
    pub launch_timeout_ms: u64,

    /// Preferred terminal emulator binary (Linux only)
    #[serde(default)]
    pub preferred: Option<String>,
}

fn default_launch_timeout_ms() -> u64 {
    3_000
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            launch_timeout_ms: default_launch_timeout_ms(),
            preferred: None,
        }
    }
}
