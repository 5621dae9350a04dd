//! Typed JSON loading on top of the record store.
//!
//! Internal bookkeeping records (preferences, indexes, per-project records)
//! load through [`load_or_default`]: content that fails to decode is moved
//! aside under a timestamped name and replaced by a fresh default. User
//! supplied content loads through [`load_strict`], which surfaces the problem.

use super::RecordStore;
use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Outcome of a self-healing load.
#[derive(Debug)]
pub enum Loaded<T> {
    /// Record decoded cleanly.
    Found(T),
    /// No record stored under the key.
    Missing(T),
    /// Record was corrupt; the original was preserved at `backup`.
    Healed { value: T, backup: PathBuf },
}

impl<T> Loaded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Loaded::Found(v) | Loaded::Missing(v) => v,
            Loaded::Healed { value, .. } => value,
        }
    }

    pub fn was_healed(&self) -> bool {
        matches!(self, Loaded::Healed { .. })
    }
}

/// Load a JSON record, recreating a default when it is missing or corrupt.
///
/// Decryption failures are not healed: a wrong passphrase must never wipe data.
pub fn load_or_default<T>(store: &dyn RecordStore, key: &str) -> Result<Loaded<T>, StorageError>
where
    T: DeserializeOwned + Serialize + Default,
{
    let bytes = match store.read(key) {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound(_)) => return Ok(Loaded::Missing(T::default())),
        Err(e) => return Err(e),
    };

    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Ok(Loaded::Found(value)),
        Err(parse_err) => {
            let backup = store.quarantine(key)?;
            warn!(
                key,
                backup = %backup.display(),
                "Corrupt record replaced with defaults: {}",
                parse_err
            );
            let value = T::default();
            store.write(key, &serde_json::to_vec_pretty(&value)?)?;
            Ok(Loaded::Healed { value, backup })
        }
    }
}

/// Load a JSON record and surface decode failures as `SchemaInvalid`.
pub fn load_strict<T>(store: &dyn RecordStore, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned,
{
    let bytes = store.read(key)?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::SchemaInvalid {
        path: store.locate(key).unwrap_or_else(|_| PathBuf::from(key)),
        reason: e.to_string(),
    })
}

/// Serialize and write a JSON record.
pub fn save_json<T: Serialize>(
    store: &dyn RecordStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    store.write(key, &serde_json::to_vec_pretty(value)?)
}
