//! StorageConfig: record store location and at-rest encryption settings.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_passphrase_env() -> String {
    "DEVSNAP_PASSPHRASE".to_string()
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Record store root; None means `$XDG_DATA_HOME/devsnap`
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub encryption: EncryptionConfig,
}

/// At-rest encryption settings. The passphrase itself lives only in the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Name of the environment variable holding the passphrase
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            passphrase_env: default_passphrase_env(),
        }
    }
}

impl StorageConfig {
    /// Resolve the record store root directory.
    pub fn resolve_root(&self) -> Result<PathBuf, ApiError> {
        match &self.root {
            Some(root) if !root.as_os_str().is_empty() => Ok(root.clone()),
            _ => xdg::data_dir(),
        }
    }

    /// Passphrase for at-rest encryption, if enabled.
    pub fn resolve_passphrase(&self) -> Result<Option<String>, ApiError> {
        if !self.encryption.enabled {
            return Ok(None);
        }
        match std::env::var(&self.encryption.passphrase_env) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            _ => Err(ApiError::ConfigError(format!(
                "Encryption is enabled but ${} is not set",
                self.encryption.passphrase_env
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let config = StorageConfig {
            root: Some(PathBuf::from("/srv/devsnap")),
            ..Default::default()
        };
        assert_eq!(config.resolve_root().unwrap(), PathBuf::from("/srv/devsnap"));
    }

    #[test]
    fn default_root_is_project_data_dir() {
        let Some(dirs) = directories::ProjectDirs::from("", "devsnap", "devsnap") else {
            return;
        };
        let config = StorageConfig {
            root: Some(PathBuf::new()),
            ..Default::default()
        };
        assert_eq!(config.resolve_root().unwrap(), dirs.data_dir());
    }

    #[test]
    fn passphrase_not_required_when_disabled() {
        assert!(StorageConfig::default().resolve_passphrase().unwrap().is_none());
    }

    #[test]
    fn enabled_without_passphrase_is_config_error() {
        let config = StorageConfig {
            root: None,
            encryption: EncryptionConfig {
                enabled: true,
                passphrase_env: "DEVSNAP_TEST_PASSPHRASE_THAT_IS_NEVER_SET".to_string(),
            },
        };
        assert!(matches!(
            config.resolve_passphrase(),
            Err(ApiError::ConfigError(_))
        ));
    }
}
