//! At-rest encryption for records.
//!
//! Encrypted records are a single line:
//! `DEVSNAP-ENC1:<iv>:<salt>:<ciphertext>:<tag>`, every field after the header
//! base64 encoded. The key is derived per record with PBKDF2-HMAC-SHA256 over
//! the passphrase and the record's random salt; the cipher is AES-256-GCM.

use crate::error::StorageError;
use aes_gcm::{
    aead::{Aead, OsRng, rand_core::RngCore},
    Aes256Gcm, KeyInit, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::Mutex;
use sha2::Sha256;
use std::collections::{HashMap, VecDeque};

/// Header tag distinguishing encrypted records from plaintext JSON.
pub const HEADER_TAG: &str = "DEVSNAP-ENC1";

pub const KDF_ITERATIONS: u32 = 100_000;

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 16;
const KEY_SIZE: usize = 32;
const TAG_SIZE: usize = 16;
/// Derived keys kept per cipher; the oldest is evicted first.
const MAX_CACHED_KEYS: usize = 64;

/// True when `bytes` carry the encrypted-record header.
pub fn is_encrypted(bytes: &[u8]) -> bool {
    bytes.starts_with(HEADER_TAG.as_bytes())
        && bytes.get(HEADER_TAG.len()) == Some(&b':')
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<[u8; SALT_SIZE], [u8; KEY_SIZE]>,
    order: VecDeque<[u8; SALT_SIZE]>,
}

impl KeyCache {
    fn insert(&mut self, salt: [u8; SALT_SIZE], key: [u8; KEY_SIZE]) {
        if self.keys.insert(salt, key).is_some() {
            return;
        }
        self.order.push_back(salt);
        while self.order.len() > MAX_CACHED_KEYS {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
    }
}

/// Passphrase-based record cipher.
pub struct RecordCipher {
    passphrase: String,
    // Derived keys by salt
    derived: Mutex<KeyCache>,
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher").finish_non_exhaustive()
    }
}

impl RecordCipher {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
            derived: Mutex::new(KeyCache::default()),
        }
    }

    fn key_for(&self, salt: &[u8; SALT_SIZE]) -> [u8; KEY_SIZE] {
        if let Some(key) = self.derived.lock().keys.get(salt) {
            return *key;
        }
        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(self.passphrase.as_bytes(), salt, KDF_ITERATIONS, &mut key);
        self.derived.lock().insert(*salt, key);
        key
    }

    /// Encrypt a plaintext payload into the tagged record format.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let mut iv = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut iv);

        let key = self.key_for(&salt);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StorageError::EncryptionFailed(format!("cipher init: {}", e)))?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|e| StorageError::EncryptionFailed(e.to_string()))?;

        // aes-gcm appends the tag to the ciphertext
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);
        let encoded = format!(
            "{}:{}:{}:{}:{}",
            HEADER_TAG,
            BASE64.encode(iv),
            BASE64.encode(salt),
            BASE64.encode(ciphertext),
            BASE64.encode(tag)
        );
        Ok(encoded.into_bytes())
    }

    /// Decrypt a tagged record. Any failure is `DecryptionFailed`.
    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, StorageError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| StorageError::DecryptionFailed("payload is not valid UTF-8".to_string()))?;
        let parts: Vec<&str> = text.trim_end().split(':').collect();
        if parts.len() != 5 || parts[0] != HEADER_TAG {
            return Err(StorageError::DecryptionFailed(
                "malformed encrypted record".to_string(),
            ));
        }

        let decode = |field: &str, name: &str| {
            BASE64
                .decode(field)
                .map_err(|e| StorageError::DecryptionFailed(format!("bad {}: {}", name, e)))
        };
        let iv = decode(parts[1], "iv")?;
        let salt = decode(parts[2], "salt")?;
        let mut sealed = decode(parts[3], "ciphertext")?;
        let tag = decode(parts[4], "tag")?;

        if iv.len() != NONCE_SIZE || tag.len() != TAG_SIZE {
            return Err(StorageError::DecryptionFailed(
                "unexpected iv or tag length".to_string(),
            ));
        }
        let salt: [u8; SALT_SIZE] = salt
            .as_slice()
            .try_into()
            .map_err(|_| StorageError::DecryptionFailed("unexpected salt length".to_string()))?;

        sealed.extend_from_slice(&tag);
        let key = self.key_for(&salt);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StorageError::DecryptionFailed(format!("cipher init: {}", e)))?;
        cipher
            .decrypt(Nonce::from_slice(&iv), sealed.as_slice())
            .map_err(|_| {
                StorageError::DecryptionFailed(
                    "authentication failed (wrong passphrase or tampered record)".to_string(),
                )
            })
    }
}
