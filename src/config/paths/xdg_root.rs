//! XDG Base Directory utilities for devsnap data and config.

use crate::error::ApiError;
use std::path::PathBuf;

/// Default record store root: the `ProjectDirs` data directory for devsnap.
///
/// On Linux this is `$XDG_DATA_HOME/devsnap` (or `~/.local/share/devsnap`).
pub fn data_dir() -> Result<PathBuf, ApiError> {
    directories::ProjectDirs::from("", "devsnap", "devsnap")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine the devsnap data directory (HOME not set)".to_string(),
            )
        })
}

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise the platform config directory.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine XDG config home directory (HOME not set)".to_string(),
            )
        })
}

/// Global config file: `$XDG_CONFIG_HOME/devsnap/config.toml`
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join("devsnap").join("config.toml"))
}
