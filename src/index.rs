//! Index Layer
//!
//! One index record per domain maps a logical key (a project root path, a
//! session id) to the record key holding the object. Callers write the record
//! before [`IndexLayer::upsert_entry`] and delete it before
//! [`IndexLayer::remove_entry`].

use crate::error::StorageError;
use crate::store::{self, RecordStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index record key for script collections (keyed by root path).
pub const SCRIPTS_INDEX_KEY: &str = "index/scripts.json";

/// Index record key for sessions (keyed by session id).
pub const SESSIONS_INDEX_KEY: &str = "index/sessions.json";

/// Mapping from a domain key to a record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub logical_key: String,
    pub record_key: String,
}

/// Index document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn get(&self, logical_key: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.logical_key == logical_key)
    }

    /// Insert or replace the entry for `logical_key`.
    pub fn upsert(&mut self, logical_key: &str, record_key: &str) {
        match self.entries.iter_mut().find(|e| e.logical_key == logical_key) {
            Some(entry) => entry.record_key = record_key.to_string(),
            None => self.entries.push(IndexEntry {
                logical_key: logical_key.to_string(),
                record_key: record_key.to_string(),
            }),
        }
    }

    /// Remove the entry for `logical_key`; returns whether one existed.
    pub fn remove(&mut self, logical_key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.logical_key != logical_key);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Index bound to one domain's index record.
pub struct IndexLayer {
    store: Arc<dyn RecordStore>,
    key: &'static str,
    // Serializes load-modify-save within this process.
    write_lock: Mutex<()>,
}

impl IndexLayer {
    pub fn new(store: Arc<dyn RecordStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            write_lock: Mutex::new(()),
        }
    }

    pub fn scripts(store: Arc<dyn RecordStore>) -> Self {
        Self::new(store, SCRIPTS_INDEX_KEY)
    }

    pub fn sessions(store: Arc<dyn RecordStore>) -> Self {
        Self::new(store, SESSIONS_INDEX_KEY)
    }

    pub fn key(&self) -> &str {
        self.key
    }

    /// Load the index, healing a corrupt document to an empty index.
    pub fn load(&self) -> Result<Index, StorageError> {
        Ok(store::load_or_default(self.store.as_ref(), self.key)?.into_inner())
    }

    pub fn save(&self, index: &Index) -> Result<(), StorageError> {
        store::save_json(self.store.as_ref(), self.key, index)
    }

    pub fn lookup(&self, logical_key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.get(logical_key).map(|e| e.record_key.clone()))
    }

    pub fn upsert_entry(&self, logical_key: &str, record_key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut index = self.load()?;
        if index.get(logical_key).map(|e| e.record_key.as_str()) == Some(record_key) {
            return Ok(());
        }
        index.upsert(logical_key, record_key);
        self.save(&index)
    }

    pub fn remove_entry(&self, logical_key: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock();
        let mut index = self.load()?;
        let removed = index.remove(logical_key);
        if removed {
            self.save(&index)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsRecordStore;

    fn layer() -> (tempfile::TempDir, Arc<FsRecordStore>, IndexLayer) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsRecordStore::open(dir.path()).unwrap());
        let layer = IndexLayer::sessions(store.clone());
        (dir, store, layer)
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let (_dir, _store, layer) = layer();
        layer.upsert_entry("s1", "sessions/s1.json").unwrap();
        layer.upsert_entry("s2", "sessions/s2.json").unwrap();
        layer.upsert_entry("s1", "sessions/s1-v2.json").unwrap();

        let index = layer.load().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            layer.lookup("s1").unwrap().as_deref(),
            Some("sessions/s1-v2.json")
        );
    }

    #[test]
    fn remove_reports_whether_entry_existed() {
        let (_dir, _store, layer) = layer();
        layer.upsert_entry("s1", "sessions/s1.json").unwrap();
        assert!(layer.remove_entry("s1").unwrap());
        assert!(!layer.remove_entry("s1").unwrap());
        assert!(layer.lookup("s1").unwrap().is_none());
    }

    #[test]
    fn corrupt_index_loads_as_empty() {
        let (dir, store, layer) = layer();
        store.write(SESSIONS_INDEX_KEY, b"]]]").unwrap();

        assert!(layer.load().unwrap().is_empty());
        let preserved = std::fs::read_dir(dir.path().join("index"))
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with("sessions.json.corrupt-"));
        assert!(preserved);
    }

    #[test]
    fn index_file_uses_logical_and_record_key_fields() {
        let (_dir, store, layer) = layer();
        layer.upsert_entry("/home/me/app", "scripts/abc.json").unwrap();
        let raw = String::from_utf8(store.read(SESSIONS_INDEX_KEY).unwrap()).unwrap();
        assert!(raw.contains("\"logicalKey\""));
        assert!(raw.contains("\"recordKey\""));
    }
}
