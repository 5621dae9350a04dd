//! Session records behind the sessions index.

use super::domain::Session;
use crate::error::{ApiError, StorageError};
use crate::index::IndexLayer;
use crate::store::{self, RecordStore};
use std::sync::Arc;
use tracing::warn;

pub fn record_key_for(id: &str) -> String {
    format!("sessions/{}.json", id)
}

pub struct SessionRepository {
    store: Arc<dyn RecordStore>,
    index: IndexLayer,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let index = IndexLayer::sessions(store.clone());
        Self { store, index }
    }

    /// Write the session record, then register it.
    pub fn save(&self, session: &Session) -> Result<(), ApiError> {
        let key = record_key_for(&session.id);
        store::save_json(self.store.as_ref(), &key, session)?;
        self.index.upsert_entry(&session.id, &key)?;
        Ok(())
    }

    fn load_record(&self, id: &str, key: &str) -> Result<Option<Session>, ApiError> {
        match store::load_strict::<Session>(self.store.as_ref(), key) {
            Ok(session) => Ok(Some(session)),
            Err(StorageError::NotFound(_)) => {
                warn!(session = id, "Index entry points at a missing session record");
                Ok(None)
            }
            Err(StorageError::SchemaInvalid { reason, .. }) => {
                // There is no sensible default session; set it aside and forget it.
                let backup = self.store.quarantine(key)?;
                self.index.remove_entry(id)?;
                warn!(
                    session = id,
                    backup = %backup.display(),
                    "Corrupt session record moved aside: {}",
                    reason
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<Session>, ApiError> {
        match self.index.lookup(id)? {
            Some(key) => self.load_record(id, &key),
            None => Ok(None),
        }
    }

    /// Every readable session, in index order.
    pub fn list(&self) -> Result<Vec<Session>, ApiError> {
        let mut sessions = Vec::new();
        for entry in self.index.load()?.entries {
            if let Some(session) = self.load_record(&entry.logical_key, &entry.record_key)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Session>, ApiError> {
        Ok(self.list()?.into_iter().find(|s| s.name == name))
    }

    /// Delete the record, then the index entry. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let key = self
            .index
            .lookup(id)?
            .unwrap_or_else(|| record_key_for(id));
        match self.store.delete(&key) {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.index.remove_entry(id)?)
    }
}
