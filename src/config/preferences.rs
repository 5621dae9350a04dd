//! User preferences stored as a record in the record store.

use crate::error::ApiError;
use crate::store::{self, RecordStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Record key holding the preferences document.
pub const PREFERENCES_KEY: &str = "config/preferences.json";

fn default_true() -> bool {
    true
}

/// Preferences that shape save and resume behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// IDE opened on resume when none is given explicitly
    #[serde(default)]
    pub default_ide: Option<String>,

    /// Checkpoint a dirty tree when saving a session
    #[serde(default)]
    pub auto_stash_on_save: bool,

    #[serde(default = "default_true")]
    pub run_scripts_on_resume: bool,

    #[serde(default)]
    pub open_ide_on_resume: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_ide: None,
            auto_stash_on_save: false,
            run_scripts_on_resume: true,
            open_ide_on_resume: false,
        }
    }
}

impl UserPreferences {
    /// Names accepted by [`UserPreferences::set`].
    pub const KEYS: [&'static str; 4] = [
        "default_ide",
        "auto_stash_on_save",
        "run_scripts_on_resume",
        "open_ide_on_resume",
    ];

    /// Set one preference from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        let parse_bool = |v: &str| -> Result<bool, ApiError> {
            match v.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                other => Err(ApiError::ValidationError(format!(
                    "Expected a boolean for {}, got '{}'",
                    key, other
                ))),
            }
        };
        match key {
            "default_ide" => {
                let value = value.trim();
                self.default_ide = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "auto_stash_on_save" => self.auto_stash_on_save = parse_bool(value)?,
            "run_scripts_on_resume" => self.run_scripts_on_resume = parse_bool(value)?,
            "open_ide_on_resume" => self.open_ide_on_resume = parse_bool(value)?,
            _ => {
                return Err(ApiError::ValidationError(format!(
                    "Unknown preference '{}'. Known: {}",
                    key,
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

/// Loads and saves [`UserPreferences`], healing a corrupt document.
#[derive(Clone)]
pub struct PreferencesRepository {
    store: Arc<dyn RecordStore>,
}

impl PreferencesRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<UserPreferences, ApiError> {
        Ok(store::load_or_default(self.store.as_ref(), PREFERENCES_KEY)?.into_inner())
    }

    pub fn save(&self, preferences: &UserPreferences) -> Result<(), ApiError> {
        store::save_json(self.store.as_ref(), PREFERENCES_KEY, preferences)?;
        Ok(())
    }

    /// Load, change one key, save.
    pub fn set(&self, key: &str, value: &str) -> Result<UserPreferences, ApiError> {
        let mut preferences = self.load()?;
        preferences.set(key, value)?;
        self.save(&preferences)?;
        Ok(preferences)
    }
}
