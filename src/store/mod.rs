//! Record Store
//!
//! Durable key -> blob storage shared by preferences, scripts and sessions.
//! Writes are atomic (temp file + rename) and optionally encrypted at rest.

pub mod crypto;
pub mod fs;
pub mod heal;

pub use crypto::RecordCipher;
pub use fs::FsRecordStore;
pub use heal::{load_or_default, load_strict, save_json, Loaded};

use crate::error::StorageError;
use std::path::PathBuf;

/// Key/blob storage contract.
///
/// Keys are relative, `/`-separated names such as `sessions/<id>.json`.
pub trait RecordStore: Send + Sync {
    /// Read a record. A missing record is `StorageError::NotFound`.
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a record atomically, replacing any previous content.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Delete a record. A missing record is `StorageError::NotFound`.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn exists(&self, key: &str) -> bool;

    /// List record keys under a prefix, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Absolute location of a record.
    fn locate(&self, key: &str) -> Result<PathBuf, StorageError>;

    /// Move the current content of a record aside under a timestamped name.
    ///
    /// Returns the backup location.
    fn quarantine(&self, key: &str) -> Result<PathBuf, StorageError>;
}
