//! Per-project script records behind the scripts index.

use super::domain::ProjectScripts;
use crate::error::{ApiError, StorageError};
use crate::index::IndexLayer;
use crate::store::{self, Loaded, RecordStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Record key for a project root: `scripts/<hash>.json`.
pub fn record_key_for(root_path: &str) -> String {
    let hash = blake3::hash(root_path.as_bytes());
    format!("scripts/{}.json", hex::encode(&hash.as_bytes()[..8]))
}

pub struct ScriptRepository {
    store: Arc<dyn RecordStore>,
    index: IndexLayer,
}

impl ScriptRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let index = IndexLayer::scripts(store.clone());
        Self { store, index }
    }

    fn key_for(&self, root_path: &str) -> Result<String, StorageError> {
        Ok(self
            .index
            .lookup(root_path)?
            .unwrap_or_else(|| record_key_for(root_path)))
    }

    /// Load the record for `root_path`, or an empty one.
    pub fn load(&self, root_path: &str) -> Result<ProjectScripts, ApiError> {
        let key = self.key_for(root_path)?;
        let loaded = store::load_or_default::<ProjectScripts>(self.store.as_ref(), &key)?;
        if let Loaded::Healed { backup, .. } = &loaded {
            warn!(root = root_path, backup = %backup.display(), "Script record was corrupt and has been reset");
        }
        let mut project = loaded.into_inner();
        if project.root_path.is_empty() {
            project.root_path = root_path.to_string();
        }
        Ok(project)
    }

    /// Write the record, then register it in the index.
    pub fn save(&self, project: &mut ProjectScripts) -> Result<(), ApiError> {
        project.updated_at = Utc::now();
        let key = self.key_for(&project.root_path)?;
        store::save_json(self.store.as_ref(), &key, project)?;
        self.index.upsert_entry(&project.root_path, &key)?;
        debug!(root = %project.root_path, scripts = project.scripts.len(), "Saved script record");
        Ok(())
    }

    /// Delete a root's record and index entry. Returns whether anything existed.
    pub fn purge(&self, root_path: &str) -> Result<bool, ApiError> {
        let key = self.key_for(root_path)?;
        let had_record = match self.store.delete(&key) {
            Ok(()) => true,
            Err(StorageError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };
        let had_entry = self.index.remove_entry(root_path)?;
        Ok(had_record || had_entry)
    }

    /// Every root path with a registered record.
    pub fn roots(&self) -> Result<Vec<String>, ApiError> {
        Ok(self
            .index
            .load()?
            .entries
            .into_iter()
            .map(|e| e.logical_key)
            .collect())
    }

    pub fn load_all(&self) -> Result<Vec<ProjectScripts>, ApiError> {
        self.roots()?.iter().map(|root| self.load(root)).collect()
    }
}
