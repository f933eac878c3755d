//! AES-256-GCM encryption for sensitive cache payloads.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

use crate::errors::{CacheError, Result};

/// Size of the encryption key in bytes.
pub const KEY_SIZE: usize = 32;

/// 12-byte nonce for AES-GCM (96 bits is the standard).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Symmetric cipher for cache payloads.
///
/// The key is generated on first use and persisted to a local file with
/// owner-only permissions; subsequent constructions reuse it. Key bytes are
/// wrapped in [`Zeroizing`] so they are wiped from memory on drop.
///
/// Blob layout: `base64(nonce(12) || auth_tag(16) || ciphertext)`.
pub struct SecretCipher {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl SecretCipher {
    /// Load the key from `path`, generating and persisting a fresh random
    /// key if the file does not exist yet.
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if path.exists() {
            let bytes = fs::read(path)
                .map_err(|e| CacheError::KeyFile(format!("{}: {e}", path.display())))?;
            let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                CacheError::KeyFile(format!(
                    "{}: expected {KEY_SIZE} bytes, got {}",
                    path.display(),
                    bytes.len()
                ))
            })?;
            return Ok(Self::from_key(key));
        }

        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::KeyFile(format!("{}: {e}", parent.display())))?;
        }
        fs::write(path, key)
            .map_err(|e| CacheError::KeyFile(format!("{}: {e}", path.display())))?;
        restrict_permissions(path)?;

        Ok(Self::from_key(key))
    }

    /// Build a cipher from raw key bytes.
    pub fn from_key(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Encrypt `plaintext` with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new_from_slice(&*self.key)
            .map_err(|e| CacheError::Decryption(format!("invalid key: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // aes-gcm appends the auth tag to the ciphertext; the wire layout
        // wants nonce || tag || body.
        let sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CacheError::Decryption(format!("encryption failed: {e}")))?;
        let (body, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        let mut blob = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + body.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(tag);
        blob.extend_from_slice(body);

        Ok(BASE64.encode(blob))
    }

    /// Decrypt a blob produced by [`Self::encrypt`].
    ///
    /// Fails on auth-tag mismatch or malformed input; callers treat this as
    /// a cache miss.
    pub fn decrypt(&self, blob: &str) -> Result<String> {
        let data = BASE64
            .decode(blob)
            .map_err(|e| CacheError::Decryption(format!("invalid base64: {e}")))?;
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CacheError::Decryption(format!(
                "blob too short: {} bytes",
                data.len()
            )));
        }

        let (nonce_bytes, rest) = data.split_at(NONCE_SIZE);
        let (tag, body) = rest.split_at(TAG_SIZE);

        let mut sealed = Vec::with_capacity(body.len() + TAG_SIZE);
        sealed.extend_from_slice(body);
        sealed.extend_from_slice(tag);

        let cipher = Aes256Gcm::new_from_slice(&*self.key)
            .map_err(|e| CacheError::Decryption(format!("invalid key: {e}")))?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed.as_slice())
            .map_err(|_| CacheError::Decryption("auth tag mismatch".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CacheError::Decryption(format!("invalid utf-8: {e}")))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| CacheError::KeyFile(format!("{}: {e}", path.display())))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
