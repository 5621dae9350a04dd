//! Filesystem-backed record store.
//!
//! One file per record under a root directory. A write goes to a sibling
//! `.tmp` file which is synced and renamed over the primary; the previous
//! primary is copied to `.bak` first.

use super::crypto::{self, RecordCipher};
use super::RecordStore;
use crate::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const TMP_SUFFIX: &str = ".tmp";
const BAK_SUFFIX: &str = ".bak";
const CORRUPT_MARKER: &str = ".corrupt-";

/// Record store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
    cipher: Option<Arc<RecordCipher>>,
}

impl FsRecordStore {
    /// Open a plaintext store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;
        let root = dunce::canonicalize(&root).map_err(|e| StorageError::io(&root, e))?;
        Ok(Self { root, cipher: None })
    }

    /// Open a store that encrypts every write with the given passphrase.
    pub fn open_encrypted(
        root: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let mut store = Self::open(root)?;
        store.cipher = Some(Arc::new(RecordCipher::new(passphrase)));
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Resolve a key to a path confined under the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.trim().is_empty() || key.contains('\0') {
            return Err(StorageError::InvalidPath(format!("invalid key {:?}", key)));
        }
        let relative = Path::new(key);
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(StorageError::InvalidPath(format!(
                        "key {:?} escapes the store root",
                        key
                    )))
                }
            }
        }
        if path == self.root {
            return Err(StorageError::InvalidPath(format!("invalid key {:?}", key)));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if file_name.ends_with(TMP_SUFFIX)
            || file_name.ends_with(BAK_SUFFIX)
            || file_name.contains(CORRUPT_MARKER)
        {
            return Err(StorageError::InvalidPath(format!(
                "key {:?} uses a reserved suffix",
                key
            )));
        }
        Ok(path)
    }

    /// Refuse parents that resolve outside the root through symlinks.
    fn ensure_parent_confined(&self, path: &Path) -> Result<(), StorageError> {
        let Some(parent) = path.parent() else {
            return Err(StorageError::InvalidPath(path.display().to_string()));
        };
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        let canonical = dunce::canonicalize(parent).map_err(|e| StorageError::io(parent, e))?;
        if !canonical.starts_with(&self.root) {
            return Err(StorageError::InvalidPath(format!(
                "{} resolves outside the store root",
                path.display()
            )));
        }
        Ok(())
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        path.with_file_name(name)
    }

    fn write_temp(tmp: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = fs::File::create(tmp).map_err(|e| StorageError::io(tmp, e))?;
        file.write_all(bytes).map_err(|e| StorageError::io(tmp, e))?;
        file.sync_all().map_err(|e| StorageError::io(tmp, e))?;
        Ok(())
    }

    fn key_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl RecordStore for FsRecordStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        if crypto::is_encrypted(&bytes) {
            let cipher = self.cipher.as_ref().ok_or_else(|| {
                StorageError::DecryptionFailed(format!(
                    "record {} is encrypted but no passphrase is configured",
                    key
                ))
            })?;
            return cipher.decrypt(&bytes);
        }
        Ok(bytes)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        self.ensure_parent_confined(&path)?;

        let payload = match &self.cipher {
            Some(cipher) => cipher.encrypt(bytes)?,
            None => bytes.to_vec(),
        };

        let tmp = Self::sibling(&path, TMP_SUFFIX);
        if let Err(e) = Self::write_temp(&tmp, &payload) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        if path.exists() {
            let bak = Self::sibling(&path, BAK_SUFFIX);
            if let Err(e) = fs::copy(&path, &bak) {
                warn!("Failed to back up {} before write: {}", path.display(), e);
            }
        }

        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::io(&path, e));
        }
        debug!(key, bytes = payload.len(), "Record written");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::io(&path, e)),
        }
        let bak = Self::sibling(&path, BAK_SUFFIX);
        if bak.exists() {
            if let Err(e) = fs::remove_file(&bak) {
                warn!("Failed to remove backup {}: {}", bak.display(), e);
            }
        }
        debug!(key, "Record deleted");
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.resolve(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let base = if prefix.trim_matches('/').is_empty() {
            self.root.clone()
        } else {
            let resolved = self.resolve(prefix.trim_end_matches('/'))?;
            if !resolved.is_dir() {
                return Ok(Vec::new());
            }
            resolved
        };

        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&base).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read entry under {}: {}", base.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.ends_with(TMP_SUFFIX)
                || name.ends_with(BAK_SUFFIX)
                || name.contains(CORRUPT_MARKER)
            {
                continue;
            }
            if let Some(key) = self.key_of(entry.path()) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn locate(&self, key: &str) -> Result<PathBuf, StorageError> {
        self.resolve(key)
    }

    fn quarantine(&self, key: &str) -> Result<PathBuf, StorageError> {
        let path = self.resolve(key)?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let backup = Self::sibling(&path, &format!("{}{}", CORRUPT_MARKER, stamp));
        fs::rename(&path, &backup).map_err(|e| StorageError::io(&path, e))?;
        Ok(backup)
    }
}
